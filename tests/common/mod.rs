use dkimsign::{
    canonicalize,
    crypto::{self, HashAlgorithm},
    decode_base64,
    header::Headers,
    signature::DKIM_SIGNATURE_NAME,
    Config, DkimHeader, Header, Message, Signer,
};
use rsa::{pkcs8::DecodePublicKey, RsaPublicKey};
use std::io;
use tokio::fs;

pub const PRIVATE_KEY_FILE: &str = "tests/keys/rsa1024.pem";
pub const PRIVATE_KEY_PKCS8_FILE: &str = "tests/keys/rsa1024.pkcs8.pem";
pub const PUBLIC_KEY_FILE: &str = "tests/keys/rsa1024.pub.pem";

pub const BODY: &str = "Hello world!\r\nHello Again!\r\n";

/// Reads a PEM file and returns its Base64 body, without BEGIN and END lines.
pub async fn read_pem_body(file_name: &str) -> io::Result<String> {
    let s = fs::read_to_string(file_name).await?;
    let mut lines: Vec<_> = s.lines().skip(1).collect();
    lines.pop();
    Ok(lines.join("\n"))
}

pub async fn read_public_key(file_name: &str) -> io::Result<RsaPublicKey> {
    let s = fs::read_to_string(file_name).await?;
    Ok(RsaPublicKey::from_public_key_pem(&s).unwrap())
}

pub fn make_config(private_key: Option<String>, params: &[(&str, &str)]) -> Config {
    Config {
        private_key,
        params: params
            .iter()
            .map(|&(k, v)| (k.into(), v.into()))
            .collect(),
    }
}

pub async fn make_signer() -> Signer {
    make_signer_with_params(&[]).await
}

/// Creates a signer with the default parameters `d=example.com`,
/// `h=from:to:subject`, `s=202209`, overridden by `params`.
pub async fn make_signer_with_params(params: &[(&str, &str)]) -> Signer {
    let key = read_pem_body(PRIVATE_KEY_FILE).await.unwrap();

    let config = make_config(
        Some(key),
        &[("d", "example.com"), ("h", "from:to:subject"), ("s", "202209")],
    );

    let mut signer = Signer::new(config).unwrap();
    signer.set_params(params.iter().copied()).unwrap();
    signer
}

pub fn make_headers(subject: &str) -> Headers {
    [
        ("From", "from@example.com"),
        ("To", "to@example.com"),
        ("Cc", "cc@example.com"),
        ("Subject", subject),
    ]
    .into_iter()
    .map(|(name, value)| Header::from_parts(name, value).unwrap())
    .collect()
}

pub fn make_message() -> Message {
    Message::new(make_headers("Subject Subject"), BODY)
}

/// Checks the signature in the first *DKIM-Signature* header of a signed
/// message against the public key.
pub fn verify_signature(message: &Message, public_key: &RsaPublicKey) -> bool {
    let header = message.headers.iter().next().unwrap();
    let dkim = DkimHeader::try_from(header).unwrap();

    let signature_data = decode_base64(&dkim.signature_data_base64().unwrap()).unwrap();

    // restore the header value as it was before signing; b= is the last tag
    let value = dkim.value();
    let i = value.rfind(';').unwrap();
    let unsigned = DkimHeader::new(format!("{} b=", &value[..=i]));

    let mut headers = message.headers.clone();
    headers.remove(DKIM_SIGNATURE_NAME);
    headers.add(unsigned.into());

    let tags = dkim.tags().unwrap();
    let mut names: Vec<_> = tags.get("h").unwrap().split(':').collect();
    if !names.iter().any(|name| name.eq_ignore_ascii_case(DKIM_SIGNATURE_NAME)) {
        names.push(DKIM_SIGNATURE_NAME);
    }

    let canonicalized = canonicalize::canonicalize_headers(&headers, &names).unwrap();
    let data_hash = crypto::digest(HashAlgorithm::Sha256, canonicalized.data.as_bytes());

    crypto::verify_rsa(HashAlgorithm::Sha256, public_key, &data_hash, &signature_data).is_ok()
}
