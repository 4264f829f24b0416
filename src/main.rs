#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    if let Err(err) = jobmesh::mcp::server::run_stdio().await {
        eprintln!("jobmesh: {}", err);
        std::process::exit(1);
    }
}
