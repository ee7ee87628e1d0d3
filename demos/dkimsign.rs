use dkimsign::{Message, Signer, SigningKey};
use std::{env, process};
use tokio::{
    fs,
    io::{self, AsyncReadExt},
};

#[tokio::main]
async fn main() {
    let _ = tracing_subscriber::fmt::try_init();

    let mut args = env::args();

    let (key_file, domain, signed_headers, selector) = match (
        args.next().as_deref(),
        args.next(),
        args.next(),
        args.next(),
        args.next(),
        args.next(),
    ) {
        (_, Some(key_file), Some(domain), Some(signed_headers), Some(selector), None) => {
            (key_file, domain, signed_headers, selector)
        }
        (program, ..) => {
            eprintln!(
                "usage: {} <key_file> <domain> <signed_headers> <selector>",
                program.unwrap_or("dkimsign")
            );
            process::exit(1);
        }
    };

    let key_file = fs::read_to_string(key_file).await.unwrap();
    let signing_key = SigningKey::from_pem(&key_file).unwrap();

    let mut signer = Signer::new(Default::default()).unwrap();
    signer
        .set_params([("d", domain), ("h", signed_headers), ("s", selector)])
        .unwrap();
    signer.set_signing_key(signing_key);

    let mut msg = String::new();
    let n = io::stdin().read_to_string(&mut msg).await.unwrap();
    assert!(n > 0, "empty message on stdin");

    let mut message: Message = msg.parse().unwrap();

    match signer.sign_message(&mut message) {
        Ok(result) => {
            for name in result.skipped_headers {
                eprintln!("note: no header {name} to sign");
            }
            let output = message.to_wire().unwrap();
            print!("{}", output.replace("\r\n", "\n"));
        }
        Err(e) => {
            eprintln!("ERROR: {e}");
            process::exit(1);
        }
    }
}
