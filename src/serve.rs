use std::net::SocketAddr;
use std::thread;

use axum::Router;
use camino::Utf8PathBuf;
use console::style;
use tower_http::services::ServeDir;

const PORT: u16 = 8080;

/// Serve the output tree as static content on a dedicated thread.
pub(crate) fn start(dir: Utf8PathBuf) -> thread::JoinHandle<Result<(), anyhow::Error>> {
    let url = style(format!("http://localhost:{PORT}/")).yellow();
    eprintln!("Serving the output tree on {url}");

    thread::spawn(move || {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?
            .block_on(serve(dir, PORT))
    })
}

async fn serve(dir: Utf8PathBuf, port: u16) -> Result<(), anyhow::Error> {
    let address = SocketAddr::from(([127, 0, 0, 1], port));
    let address = tokio::net::TcpListener::bind(address).await?;

    let router = Router::new().fallback_service(ServeDir::new(dir.as_std_path()));

    axum::serve(address, router).await?;

    Ok(())
}
