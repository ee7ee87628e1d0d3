// dkimsign – DKIM signing of outgoing email messages
// Copyright © 2022–2023 David Bürgin <dbuergin@gluet.ch>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, either version 3 of the License, or (at your option) any later
// version.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more
// details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.

//! Message body.

use std::fmt::Debug;

/// A structured body that can be flattened into its wire representation.
pub trait RenderBody: Debug + Send + Sync {
    /// Renders the body as flat text.
    fn render(&self) -> String;
}

/// The body of a message: either flat text or a structured value.
#[derive(Debug)]
pub enum Body {
    Text(String),
    Structured(Box<dyn RenderBody>),
}

impl Body {
    pub fn structured(body: impl RenderBody + 'static) -> Self {
        Self::Structured(Box::new(body))
    }

    /// Returns the flat text of the body, rendering it first if structured.
    pub fn to_text(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Structured(b) => b.render(),
        }
    }

    /// Returns the text if the body is flat.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Structured(_) => None,
        }
    }
}

impl Default for Body {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl From<String> for Body {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for Body {
    fn from(s: &str) -> Self {
        Self::Text(s.into())
    }
}
