#[tokio::main]
async fn main() {
    menta::start_server().await;
}
