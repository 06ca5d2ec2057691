use std::net::SocketAddr;

use cookie_sessions::{routes, AppState, Config, SessionClient, UserRecord};

async fn spawn_server() -> String {
    let config = Config::from_lookup(|key| match key {
        "COOKIE_SECRET" => Some("remote-client-secret".to_string()),
        _ => None,
    })
    .unwrap();
    let app = routes::app(AppState::new(&config).unwrap());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

#[tokio::test]
async fn client_drives_the_full_session_lifecycle() {
    let base_url = spawn_server().await;
    let client = SessionClient::new(&base_url).unwrap();

    assert_eq!(client.get_current_user().await, None);

    assert!(client.init_remote().await);
    assert_eq!(client.get_current_user().await, None);

    let user = UserRecord::new()
        .with_id("u1")
        .with_email("a@b.com")
        .with_roles(["user"]);
    assert!(client.set_remote(Some(&user)).await);

    let current = client.get_current_user().await.expect("session is set");
    assert_eq!(current, user);
    assert_eq!(current.email(), Some("a@b.com"));

    // a second browser has its own cookie jar
    let stranger = SessionClient::new(&base_url).unwrap();
    assert_eq!(stranger.get_current_user().await, None);

    assert!(client.logout_remote().await);
    assert_eq!(client.get_current_user().await, None);
}

#[tokio::test]
async fn setting_null_clears_the_user() {
    let base_url = spawn_server().await;
    let client = SessionClient::new(base_url).unwrap();

    assert!(client.set_remote(Some(&UserRecord::new().with_id("u9"))).await);
    assert!(client.get_current_user().await.is_some());

    assert!(client.set_remote(None).await);
    assert_eq!(client.get_current_user().await, None);
}
