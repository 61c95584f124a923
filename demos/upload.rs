//! Example: upload an image and print the results-page URL.

use imgseek::{SearchClient, UploadOptions};

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let path = match std::env::args().nth(1) {
        Some(p) => p,
        None => {
            eprintln!("usage: upload <image-file>");
            std::process::exit(2);
        }
    };

    println!("imgseek v{}", imgseek::VERSION);

    let client = SearchClient::builder().build().expect("client should build");
    let options = UploadOptions {
        include_file_name: true,
        resize: true,
    };

    match client.upload(&path, options).await {
        Ok(url) => println!("Results: {url}"),
        Err(e) => {
            eprintln!("Upload failed: {e}");
            std::process::exit(1);
        }
    }
}
