#[cfg(feature = "http_api")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use std::net::SocketAddr;

    use sprint_insight::{logging, proxy};

    logging::init();

    let addr: SocketAddr = match std::env::var("SPRINT_PROXY_ADDR") {
        Ok(addr) => addr.parse()?,
        Err(_) => {
            let port = std::env::var("PORT").unwrap_or_else(|_| "4000".to_string());
            format!("0.0.0.0:{port}").parse()?
        }
    };

    let state = proxy::AppState::from_env()?;
    println!("sprint proxy listening on http://{addr}");
    proxy::serve(addr, state).await?;
    Ok(())
}

#[cfg(not(feature = "http_api"))]
fn main() {
    eprintln!("Rebuild with the `http_api` feature to enable the proxy server.");
}
