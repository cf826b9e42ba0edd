use calendar_digest::config::DEFAULT_TOKEN_URL;
use calendar_digest::error::{auth_error, env_error, other_error, DigestResult};
use dotenvy::dotenv;
use serde::Deserialize;
use std::env;
use url::Url;

const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const REDIRECT_URI: &str = "http://localhost:8080";
const CALENDAR_SCOPE: &str = "https://www.googleapis.com/auth/calendar.readonly";

#[derive(Debug, Deserialize)]
struct CodeExchangeResponse {
    refresh_token: Option<String>,
    expires_in: Option<i64>,
}

#[tokio::main]
async fn main() -> DigestResult<()> {
    dotenv().ok();

    let client_id = env::var("GOOGLE_CLIENT_ID").map_err(|_| env_error("GOOGLE_CLIENT_ID"))?;
    let client_secret =
        env::var("GOOGLE_CLIENT_SECRET").map_err(|_| env_error("GOOGLE_CLIENT_SECRET"))?;
    let token_url = env::var("GOOGLE_TOKEN_URL").unwrap_or_else(|_| DEFAULT_TOKEN_URL.to_string());

    // Generate random state for security
    let state = uuid::Uuid::new_v4().to_string();

    // Construct authorization URL
    let auth_url = Url::parse_with_params(
        AUTH_URL,
        &[
            ("client_id", client_id.as_str()),
            ("redirect_uri", REDIRECT_URI),
            ("response_type", "code"),
            ("access_type", "offline"),
            ("prompt", "consent"),
            ("scope", CALENDAR_SCOPE),
            ("state", state.as_str()),
        ],
    )
    .map_err(|e| other_error(&format!("Failed to build authorization URL: {}", e)))?;

    // Open browser for authorization
    println!("Opening browser for Google Calendar authorization...");
    if webbrowser::open(auth_url.as_str()).is_err() {
        println!("Could not open a browser, visit this URL instead:\n{}", auth_url);
    }

    // Start local server to receive the callback
    let server = tiny_http::Server::http("127.0.0.1:8080")
        .map_err(|e| other_error(&format!("Failed to start callback server: {}", e)))?;
    println!("Waiting for authorization callback...");

    let request = server.recv()?;
    let callback = Url::parse(&format!("{}{}", REDIRECT_URI, request.url()))
        .map_err(|e| other_error(&format!("Invalid callback URL: {}", e)))?;

    let param = |name: &str| {
        callback
            .query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    };

    if param("state").as_deref() != Some(state.as_str()) {
        request.respond(tiny_http::Response::from_string("State mismatch, please retry."))?;
        return Err(auth_error("OAuth state mismatch in callback"));
    }

    let code = match param("code") {
        Some(code) => code,
        None => {
            let reason = param("error").unwrap_or_else(|| "no authorization code".to_string());
            request.respond(tiny_http::Response::from_string("Authorization failed."))?;
            return Err(auth_error(&format!("Authorization failed: {}", reason)));
        }
    };

    // Exchange code for tokens
    let response = reqwest::Client::new()
        .post(&token_url)
        .form(&[
            ("client_id", client_id.as_str()),
            ("client_secret", client_secret.as_str()),
            ("code", code.as_str()),
            ("redirect_uri", REDIRECT_URI),
            ("grant_type", "authorization_code"),
        ])
        .send()
        .await?;

    if !response.status().is_success() {
        let error_text = response.text().await?;
        request.respond(tiny_http::Response::from_string("Token exchange failed."))?;
        return Err(auth_error(&format!("Failed to get token: {}", error_text)));
    }

    let token: CodeExchangeResponse = response.json().await?;

    let refresh_token = token.refresh_token.ok_or_else(|| {
        auth_error("No refresh token returned; revoke the app's access and run again")
    })?;

    // Send success response to browser
    request.respond(tiny_http::Response::from_string(
        "Authorization successful! You can close this window.",
    ))?;

    println!(
        "Access token valid for {} seconds. Add this to your environment:\n",
        token.expires_in.unwrap_or(3600)
    );
    println!("GOOGLE_REFRESH_TOKEN={}", refresh_token);

    Ok(())
}
