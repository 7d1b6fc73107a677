//! Client for the remote game API.
//!
//! Every endpoint answers with a JSON envelope that may carry `statusCode`,
//! `status`, `message`, `msg`, `data` and `accessToken`. The classification
//! helpers below turn an envelope into a typed result per operation; the
//! [`HttpGameApi`] only moves bytes.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::grid::{Feedback, LetterStatus};
use crate::stats::{MyStats, StatEntry};

const GAME_ALREADY_COMPLETE: &str = "You have already played every word.";
const WORD_NOT_FOUND: &str = "Word not found.";
const LOGIN_FAILED: &str = "Invalid email or password.";
const SIGN_UP_FAILED: &str = "Failed to create account. Please try again.";

/// Server reply to a scored attempt.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AttemptReply {
    pub feedback: Option<Feedback>,
    /// Win or loss text. Present only when the attempt ended the game.
    pub completion: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewAccount {
    pub email: String,
    pub username: String,
    pub password: String,
}

/// Remote operations the client depends on.
pub trait GameApi: Send + Sync + 'static {
    fn create_game(&self, token: &str) -> Result<(), ApiError>;
    fn submit_attempt(&self, token: &str, word: &str) -> Result<AttemptReply, ApiError>;
    /// Closes the server-side game record. Returns the server message, if any.
    fn finish_game(&self, token: &str) -> Result<Option<String>, ApiError>;

    /// Returns the access token.
    fn log_in(&self, email: &str, password: &str) -> Result<String, ApiError>;
    fn sign_up(&self, account: &NewAccount) -> Result<(), ApiError>;

    fn my_stats(&self, token: &str) -> Result<MyStats, ApiError>;
    fn top_words(&self, token: &str) -> Result<Vec<StatEntry>, ApiError>;
    fn top_players(&self, token: &str) -> Result<Vec<StatEntry>, ApiError>;
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Envelope {
    status_code: Option<Value>,
    status: Option<Value>,
    message: Option<Value>,
    msg: Option<String>,
    data: Option<Value>,
    access_token: Option<String>,
}

impl Envelope {
    pub(crate) fn parse(body: &str) -> Result<Self, ApiError> {
        if body.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    fn status_code(&self) -> Option<u16> {
        self.status_code.as_ref().and_then(as_code)
    }

    fn status(&self) -> Option<u16> {
        self.status.as_ref().and_then(as_code)
    }

    /// The most specific status available: body `statusCode`, then body
    /// `status`, then the HTTP status line.
    fn code(&self, http_status: u16) -> u16 {
        self.status_code().or(self.status()).unwrap_or(http_status)
    }

    fn is_unauthenticated(&self, http_status: u16) -> bool {
        self.status_code() == Some(401) || http_status == 401
    }

    fn message(&self) -> Option<String> {
        self.message.as_ref().and_then(message_text)
    }

    fn take_data<T: serde::de::DeserializeOwned>(&mut self) -> Result<T, ApiError> {
        let data = self
            .data
            .take()
            .ok_or_else(|| ApiError::Decode("missing data".to_string()))?;
        serde_json::from_value(data).map_err(|e| ApiError::Decode(e.to_string()))
    }

    fn failure(&self, code: u16) -> ApiError {
        ApiError::Status {
            status: code,
            message: self.message().or_else(|| self.msg.clone()).unwrap_or_default(),
        }
    }
}

fn as_code(value: &Value) -> Option<u16> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u16::try_from(n).ok()),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn message_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Array(items) => {
            let parts: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
            (!parts.is_empty()).then(|| parts.join(", "))
        }
        _ => None,
    }
}

fn is_client_error(code: u16) -> bool {
    (400..500).contains(&code)
}

fn is_success(code: u16) -> bool {
    (200..300).contains(&code)
}

#[derive(Debug, Deserialize)]
struct WireLetter {
    #[allow(dead_code)]
    letter: String,
    status: LetterStatus,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireWordStat {
    word: String,
    total_guesses: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePlayerStat {
    user: String,
    total_wins: u32,
}

fn parse_feedback(value: Value) -> Result<Feedback, ApiError> {
    let wire: HashMap<String, WireLetter> =
        serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))?;
    wire.into_iter()
        .map(|(key, letter)| {
            key.parse::<usize>()
                .map(|col| (col, letter.status))
                .map_err(|_| ApiError::Decode(format!("feedback key {key:?} is not a column")))
        })
        .collect()
}

pub(crate) fn classify_create(http_status: u16, envelope: &Envelope) -> Result<(), ApiError> {
    if envelope.is_unauthenticated(http_status) {
        return Err(ApiError::Unauthenticated);
    }
    if envelope.status() == Some(400) {
        return Err(ApiError::GameAlreadyComplete(
            envelope
                .message()
                .unwrap_or_else(|| GAME_ALREADY_COMPLETE.to_string()),
        ));
    }
    let code = envelope.code(http_status);
    if code >= 400 {
        return Err(envelope.failure(code));
    }
    Ok(())
}

pub(crate) fn classify_attempt(
    http_status: u16,
    mut envelope: Envelope,
) -> Result<AttemptReply, ApiError> {
    if envelope.status() == Some(404) {
        return Err(ApiError::Rejected(
            envelope.message().unwrap_or_else(|| WORD_NOT_FOUND.to_string()),
        ));
    }
    if envelope.is_unauthenticated(http_status) {
        return Err(ApiError::Unauthenticated);
    }
    let code = envelope.code(http_status);
    if code >= 400 {
        return Err(envelope.failure(code));
    }

    let feedback = match envelope.data.take() {
        Some(Value::Null) | None => None,
        Some(data) => Some(parse_feedback(data)?),
    };
    Ok(AttemptReply {
        feedback,
        completion: envelope.message(),
    })
}

pub(crate) fn classify_finish(
    http_status: u16,
    envelope: &Envelope,
) -> Result<Option<String>, ApiError> {
    if envelope.is_unauthenticated(http_status) {
        return Err(ApiError::Unauthenticated);
    }
    Ok(envelope.message())
}

pub(crate) fn classify_login(http_status: u16, envelope: Envelope) -> Result<String, ApiError> {
    let code = envelope.code(http_status);
    if is_success(code) {
        return envelope
            .access_token
            .ok_or_else(|| ApiError::Decode("missing accessToken".to_string()));
    }
    let message = if is_client_error(code) {
        envelope
            .msg
            .clone()
            .or_else(|| envelope.message())
            .unwrap_or_else(|| LOGIN_FAILED.to_string())
    } else {
        LOGIN_FAILED.to_string()
    };
    Err(ApiError::Status {
        status: code,
        message,
    })
}

pub(crate) fn classify_sign_up(http_status: u16, envelope: &Envelope) -> Result<(), ApiError> {
    let code = envelope.code(http_status);
    if is_success(code) {
        return Ok(());
    }
    let message = if is_client_error(code) {
        envelope
            .msg
            .clone()
            .or_else(|| envelope.message())
            .unwrap_or_else(|| SIGN_UP_FAILED.to_string())
    } else {
        SIGN_UP_FAILED.to_string()
    };
    Err(ApiError::Status {
        status: code,
        message,
    })
}

/// Stats endpoints treat every client error as an expired session.
fn classify_stats<T: serde::de::DeserializeOwned>(
    http_status: u16,
    mut envelope: Envelope,
) -> Result<T, ApiError> {
    let code = envelope.code(http_status);
    if is_client_error(code) {
        return Err(ApiError::Unauthenticated);
    }
    if code >= 500 {
        return Err(envelope.failure(code));
    }
    envelope.take_data()
}

pub(crate) fn classify_top_words(
    http_status: u16,
    envelope: Envelope,
) -> Result<Vec<StatEntry>, ApiError> {
    let words: Vec<WireWordStat> = classify_stats(http_status, envelope)?;
    Ok(words
        .into_iter()
        .map(|w| StatEntry::Word {
            word: w.word,
            total_guesses: w.total_guesses,
        })
        .collect())
}

pub(crate) fn classify_top_players(
    http_status: u16,
    envelope: Envelope,
) -> Result<Vec<StatEntry>, ApiError> {
    let players: Vec<WirePlayerStat> = classify_stats(http_status, envelope)?;
    Ok(players
        .into_iter()
        .map(|p| StatEntry::Player {
            user: p.user,
            total_wins: p.total_wins,
        })
        .collect())
}

/// [`GameApi`] over HTTP with a blocking client. Calls are made from worker
/// threads, never from the UI loop.
#[derive(Debug, Clone)]
pub struct HttpGameApi {
    client: Client,
    base_url: String,
}

impl HttpGameApi {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn send(&self, request: RequestBuilder) -> Result<(u16, Envelope), ApiError> {
        let response = request.send().map_err(|e| {
            warn!(error = %e, "request failed");
            ApiError::from(e)
        })?;
        let status = response.status().as_u16();
        let body = response.text()?;
        debug!(status, bytes = body.len(), "response received");
        Ok((status, Envelope::parse(&body)?))
    }
}

impl GameApi for HttpGameApi {
    fn create_game(&self, token: &str) -> Result<(), ApiError> {
        debug!("POST /game-core/create-game");
        let (status, envelope) = self.send(
            self.client
                .post(self.url("/game-core/create-game"))
                .bearer_auth(token),
        )?;
        classify_create(status, &envelope)
    }

    fn submit_attempt(&self, token: &str, word: &str) -> Result<AttemptReply, ApiError> {
        debug!(word, "PUT /game-core/guess-word");
        let (status, envelope) = self.send(
            self.client
                .put(self.url("/game-core/guess-word"))
                .bearer_auth(token)
                .json(&serde_json::json!({ "word": word })),
        )?;
        classify_attempt(status, envelope)
    }

    fn finish_game(&self, token: &str) -> Result<Option<String>, ApiError> {
        debug!("DELETE /game-core/finish-game");
        let (status, envelope) = self.send(
            self.client
                .delete(self.url("/game-core/finish-game"))
                .bearer_auth(token),
        )?;
        classify_finish(status, &envelope)
    }

    fn log_in(&self, email: &str, password: &str) -> Result<String, ApiError> {
        debug!(email, "POST /auth/login");
        let (status, envelope) = self.send(
            self.client
                .post(self.url("/auth/login"))
                .json(&serde_json::json!({ "email": email, "password": password })),
        )?;
        classify_login(status, envelope)
    }

    fn sign_up(&self, account: &NewAccount) -> Result<(), ApiError> {
        debug!(email = %account.email, "POST /user/create");
        let (status, envelope) =
            self.send(self.client.post(self.url("/user/create")).json(account))?;
        classify_sign_up(status, &envelope)
    }

    fn my_stats(&self, token: &str) -> Result<MyStats, ApiError> {
        let (status, envelope) = self.send(
            self.client
                .get(self.url("/game-stats/my-stats"))
                .bearer_auth(token),
        )?;
        classify_stats(status, envelope)
    }

    fn top_words(&self, token: &str) -> Result<Vec<StatEntry>, ApiError> {
        let (status, envelope) = self.send(
            self.client
                .get(self.url("/game-stats/top-words"))
                .bearer_auth(token),
        )?;
        classify_top_words(status, envelope)
    }

    fn top_players(&self, token: &str) -> Result<Vec<StatEntry>, ApiError> {
        let (status, envelope) = self.send(
            self.client
                .get(self.url("/game-stats/top-players"))
                .bearer_auth(token),
        )?;
        classify_top_players(status, envelope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn env(body: &str) -> Envelope {
        Envelope::parse(body).unwrap()
    }

    #[test]
    fn empty_body_is_an_empty_envelope() {
        assert!(classify_create(201, &env("")).is_ok());
    }

    #[test]
    fn invalid_json_is_a_decode_error() {
        assert_matches!(Envelope::parse("<html>"), Err(ApiError::Decode(_)));
    }

    #[test]
    fn create_game_unauthenticated() {
        let e = env(r#"{"statusCode":401,"message":"Unauthorized"}"#);
        assert_eq!(classify_create(401, &e), Err(ApiError::Unauthenticated));
    }

    #[test]
    fn create_game_already_complete_carries_message() {
        let e = env(r#"{"status":400,"message":"No words left"}"#);
        assert_eq!(
            classify_create(200, &e),
            Err(ApiError::GameAlreadyComplete("No words left".into()))
        );
    }

    #[test]
    fn create_game_server_error() {
        let e = env(r#"{"statusCode":500,"message":"boom"}"#);
        assert_matches!(
            classify_create(500, &e),
            Err(ApiError::Status { status: 500, .. })
        );
    }

    #[test]
    fn attempt_feedback_is_keyed_by_column() {
        let body = r#"{"data":{
            "0":{"letter":"C","status":"absent"},
            "1":{"letter":"R","status":"present"},
            "2":{"letter":"A","status":"correct"},
            "3":{"letter":"N","status":"absent"},
            "4":{"letter":"E","status":"correct"}}}"#;
        let reply = classify_attempt(200, env(body)).unwrap();
        let feedback = reply.feedback.unwrap();
        assert_eq!(feedback.len(), 5);
        assert_eq!(feedback[&0], LetterStatus::Absent);
        assert_eq!(feedback[&1], LetterStatus::Present);
        assert_eq!(reply.completion, None);
    }

    #[test]
    fn attempt_with_message_signals_completion() {
        let body = r#"{"message":"You won!","data":{"0":{"letter":"A","status":"correct"}}}"#;
        let reply = classify_attempt(200, env(body)).unwrap();
        assert_eq!(reply.completion.as_deref(), Some("You won!"));
        assert!(reply.feedback.is_some());
    }

    #[test]
    fn attempt_rejected_word() {
        let e = env(r#"{"status":404,"message":"Word not in dictionary"}"#);
        assert_eq!(
            classify_attempt(200, e),
            Err(ApiError::Rejected("Word not in dictionary".into()))
        );
    }

    #[test]
    fn attempt_unauthenticated() {
        let e = env(r#"{"statusCode":401,"message":"Unauthorized"}"#);
        assert_eq!(classify_attempt(401, e), Err(ApiError::Unauthenticated));
    }

    #[test]
    fn attempt_with_bad_column_key() {
        let e = env(r#"{"data":{"x":{"letter":"A","status":"correct"}}}"#);
        assert_matches!(classify_attempt(200, e), Err(ApiError::Decode(_)));
    }

    #[test]
    fn finish_game_returns_message() {
        let e = env(r#"{"message":"Time is up! The word was CRANE"}"#);
        assert_eq!(
            classify_finish(200, &e),
            Ok(Some("Time is up! The word was CRANE".into()))
        );
    }

    #[test]
    fn message_lists_are_joined() {
        let e = env(r#"{"status":400,"message":["a","b"]}"#);
        assert_eq!(
            classify_create(400, &e),
            Err(ApiError::GameAlreadyComplete("a, b".into()))
        );
    }

    #[test]
    fn login_success_returns_token() {
        let e = env(r#"{"status":200,"accessToken":"abc"}"#);
        assert_eq!(classify_login(200, e), Ok("abc".into()));
    }

    #[test]
    fn login_client_error_surfaces_msg() {
        let e = env(r#"{"status":401,"msg":"Wrong password"}"#);
        assert_eq!(
            classify_login(401, e),
            Err(ApiError::Status {
                status: 401,
                message: "Wrong password".into()
            })
        );
    }

    #[test]
    fn login_server_error_uses_fixed_message() {
        let e = env(r#"{"status":500,"msg":"stack trace"}"#);
        assert_eq!(
            classify_login(500, e).unwrap_err().user_message(),
            "Invalid email or password."
        );
    }

    #[test]
    fn sign_up_success_and_failure() {
        assert!(classify_sign_up(201, &env(r#"{"status":201}"#)).is_ok());
        assert_eq!(
            classify_sign_up(200, &env(r#"{"status":409,"msg":"Email taken"}"#))
                .unwrap_err()
                .user_message(),
            "Email taken"
        );
    }

    #[test]
    fn stats_are_decoded_into_tagged_entries() {
        let words = classify_top_words(
            200,
            env(r#"{"data":[{"word":"CRANE","totalGuesses":7}]}"#),
        )
        .unwrap();
        assert_eq!(
            words,
            vec![StatEntry::Word {
                word: "CRANE".into(),
                total_guesses: 7
            }]
        );

        let players = classify_top_players(
            200,
            env(r#"{"data":[{"user":"ana","totalWins":3}]}"#),
        )
        .unwrap();
        assert_eq!(
            players,
            vec![StatEntry::Player {
                user: "ana".into(),
                total_wins: 3
            }]
        );
    }

    #[test]
    fn stats_client_error_means_unauthenticated() {
        let e = env(r#"{"statusCode":403}"#);
        assert_eq!(
            classify_stats::<MyStats>(403, e),
            Err(ApiError::Unauthenticated)
        );
    }

    #[test]
    fn my_stats_decodes() {
        let e = env(r#"{"data":{"totalGames":4,"totalVictories":1}}"#);
        let stats: MyStats = classify_stats(200, e).unwrap();
        assert_eq!(stats.total_games, 4);
        assert_eq!(stats.total_victories, 1);
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let api = HttpGameApi::new("http://localhost:3000/", Duration::from_secs(1)).unwrap();
        assert_eq!(api.base_url(), "http://localhost:3000");
        assert_eq!(
            api.url("/game-core/create-game"),
            "http://localhost:3000/game-core/create-game"
        );
    }
}
