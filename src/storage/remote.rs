//! A [`Store`] backed by a hosted PostgREST-style table API.
//!
//! Each collection maps to a table of the same name. Records travel as rows
//! with snake_case column names (`task_player_a`, `game_ids`, `created_at`,
//! ...), and the store assigns identifiers and timestamps.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::{
    blocking::{Client, RequestBuilder, Response},
    header::{ACCEPT, AUTHORIZATION},
    Method, Url,
};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Map, Value};

use crate::{
    domain::{Game, GameDraft, GamePatch, Lesson, LessonDraft, LessonPatch, Record, RecordId},
    storage::{Store, StoreError},
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Media type asking the table API for a single object instead of an array.
const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

/// A record type that can be stored in a remote table.
pub trait RemoteRecord: Record {
    /// The row shape returned by the table API.
    type Row: DeserializeOwned;

    /// Converts a stored row into a record.
    fn from_row(row: Self::Row) -> Self;

    /// The columns written when creating a record from a draft.
    fn draft_columns(draft: &Self::Draft) -> Value;

    /// The columns written by a partial update. Absent fields are omitted.
    fn patch_columns(patch: &Self::Patch) -> Value;
}

/// Client for the hosted table API.
#[derive(Debug, Clone)]
pub struct RemoteStore {
    client: Client,
    base_url: Url,
    access_key: String,
}

impl RemoteStore {
    /// Prepares a client for the given endpoint and access key.
    ///
    /// No request is made; use [`RemoteStore::probe`] to check the
    /// connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint is not an `http(s)` URL or the HTTP
    /// client cannot be built.
    pub fn connect(endpoint: &str, access_key: &str) -> Result<Self, StoreError> {
        let base_url = Url::parse(endpoint.trim_end_matches('/'))
            .map_err(|_| StoreError::Endpoint(endpoint.to_string()))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(StoreError::Endpoint(endpoint.to_string()));
        }

        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            client,
            base_url,
            access_key: access_key.to_string(),
        })
    }

    /// The endpoint requests are sent to.
    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.base_url
    }

    fn table_url(&self, table: &str) -> String {
        format!(
            "{}/rest/v1/{table}",
            self.base_url.as_str().trim_end_matches('/')
        )
    }

    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        self.client
            .request(method, self.table_url(table))
            .header("apikey", &self.access_key)
            .header(AUTHORIZATION, format!("Bearer {}", self.access_key))
    }

    fn send(request: RequestBuilder) -> Result<Response, StoreError> {
        let response = request.send()?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().unwrap_or_default();
        Err(StoreError::Remote {
            status: status.as_u16(),
            message: error_message(&body).unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("unknown error")
                    .to_string()
            }),
        })
    }

    fn decode<T: DeserializeOwned>(response: Response) -> Result<T, StoreError> {
        let body = response.text()?;
        serde_json::from_str(&body).map_err(|e| StoreError::Decode(e.to_string()))
    }

    /// Checks that the games table is reachable with the configured key.
    ///
    /// # Errors
    ///
    /// Returns the transport or remote error encountered.
    pub fn probe(&self) -> Result<(), StoreError> {
        Self::send(
            self.request(Method::GET, Game::COLLECTION)
                .query(&[("select", "id"), ("limit", "1")]),
        )?;
        Ok(())
    }
}

/// Extracts the `message` field of an error body.
fn error_message(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct ErrorBody {
        message: Option<String>,
        hint: Option<String>,
    }

    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    match (parsed.message, parsed.hint) {
        (Some(message), Some(hint)) if !hint.is_empty() => Some(format!("{message} ({hint})")),
        (message, _) => message,
    }
}

fn id_filter(id: &RecordId) -> [(&'static str, String); 1] {
    [("id", format!("eq.{id}"))]
}

impl<R: RemoteRecord> Store<R> for RemoteStore {
    fn list(&self) -> Result<Vec<R>, StoreError> {
        let response = Self::send(
            self.request(Method::GET, R::COLLECTION)
                .query(&[("select", "*"), ("order", "created_at.desc")]),
        )?;
        let rows: Vec<R::Row> = Self::decode(response)?;
        tracing::debug!("Fetched {} {} rows", rows.len(), R::COLLECTION);
        Ok(rows.into_iter().map(R::from_row).collect())
    }

    fn create(&self, draft: R::Draft) -> Result<R, StoreError> {
        let response = Self::send(
            self.request(Method::POST, R::COLLECTION)
                .header("Prefer", "return=representation")
                .header(ACCEPT, SINGLE_OBJECT)
                .json(&R::draft_columns(&draft)),
        )?;
        let record = R::from_row(Self::decode(response)?);
        tracing::debug!("Created {} row {}", R::COLLECTION, record.id());
        Ok(record)
    }

    fn update(&self, id: &RecordId, patch: R::Patch) -> Result<R, StoreError> {
        let response = Self::send(
            self.request(Method::PATCH, R::COLLECTION)
                .query(&id_filter(id))
                .header("Prefer", "return=representation")
                .header(ACCEPT, SINGLE_OBJECT)
                .json(&R::patch_columns(&patch)),
        )?;
        Ok(R::from_row(Self::decode(response)?))
    }

    fn delete(&self, id: &RecordId) -> Result<(), StoreError> {
        Self::send(
            self.request(Method::DELETE, R::COLLECTION)
                .query(&id_filter(id)),
        )?;
        tracing::debug!("Deleted {} row {id}", R::COLLECTION);
        Ok(())
    }
}

fn insert_present(columns: &mut Map<String, Value>, column: &str, value: Option<&String>) {
    if let Some(value) = value {
        columns.insert(column.to_string(), Value::String(value.clone()));
    }
}

/// A row of the `games` table.
#[derive(Debug, Deserialize)]
pub struct GameRow {
    id: RecordId,
    #[serde(default, deserialize_with = "nullable_text")]
    name: String,
    #[serde(default, deserialize_with = "nullable_text")]
    position: String,
    #[serde(default, deserialize_with = "nullable_text")]
    invariant: String,
    #[serde(default, deserialize_with = "nullable_text")]
    task_player_a: String,
    #[serde(default, deserialize_with = "nullable_text")]
    task_player_b: String,
    #[serde(default, deserialize_with = "nullable_text")]
    differentiation: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RemoteRecord for Game {
    type Row = GameRow;

    fn from_row(row: GameRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            position: row.position,
            invariant: row.invariant,
            task_player_a: row.task_player_a,
            task_player_b: row.task_player_b,
            differentiation: row.differentiation,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }

    fn draft_columns(draft: &GameDraft) -> Value {
        json!({
            "name": draft.name,
            "position": draft.position,
            "invariant": draft.invariant,
            "task_player_a": draft.task_player_a,
            "task_player_b": draft.task_player_b,
            "differentiation": draft.differentiation,
        })
    }

    fn patch_columns(patch: &GamePatch) -> Value {
        let mut columns = Map::new();
        insert_present(&mut columns, "name", patch.name.as_ref());
        insert_present(&mut columns, "position", patch.position.as_ref());
        insert_present(&mut columns, "invariant", patch.invariant.as_ref());
        insert_present(&mut columns, "task_player_a", patch.task_player_a.as_ref());
        insert_present(&mut columns, "task_player_b", patch.task_player_b.as_ref());
        insert_present(&mut columns, "differentiation", patch.differentiation.as_ref());
        Value::Object(columns)
    }
}

/// A row of the `lessons` table.
#[derive(Debug, Deserialize)]
pub struct LessonRow {
    id: RecordId,
    #[serde(default, deserialize_with = "nullable_text")]
    name: String,
    #[serde(default, deserialize_with = "nullable_text")]
    description: String,
    #[serde(default)]
    duration: Option<i64>,
    #[serde(default, deserialize_with = "nullable_text")]
    level: String,
    #[serde(default, deserialize_with = "nullable_text")]
    notes: String,
    #[serde(default)]
    game_ids: Option<Vec<RecordId>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RemoteRecord for Lesson {
    type Row = LessonRow;

    fn from_row(row: LessonRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            duration: row
                .duration
                .and_then(|minutes| u32::try_from(minutes).ok())
                .filter(|&minutes| minutes > 0),
            level: row.level,
            notes: row.notes,
            game_ids: row.game_ids.unwrap_or_default(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }

    fn draft_columns(draft: &LessonDraft) -> Value {
        json!({
            "name": draft.name,
            "description": draft.description,
            "duration": draft.duration_minutes(),
            "level": draft.level,
            "notes": draft.notes,
            "game_ids": draft.game_ids,
        })
    }

    fn patch_columns(patch: &LessonPatch) -> Value {
        let mut columns = Map::new();
        insert_present(&mut columns, "name", patch.name.as_ref());
        insert_present(&mut columns, "description", patch.description.as_ref());
        if let Some(duration) = patch.duration_minutes() {
            columns.insert("duration".to_string(), json!(duration));
        }
        insert_present(&mut columns, "level", patch.level.as_ref());
        insert_present(&mut columns, "notes", patch.notes.as_ref());
        if let Some(game_ids) = &patch.game_ids {
            columns.insert("game_ids".to_string(), json!(game_ids));
        }
        Value::Object(columns)
    }
}

fn nullable_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use std::{
        io::{BufRead, BufReader, Read, Write},
        net::TcpListener,
        sync::{Arc, Mutex},
        thread::{self, JoinHandle},
    };

    use super::*;

    /// A request as seen by the stub server.
    #[derive(Debug, Clone)]
    struct Seen {
        request_line: String,
        headers: Vec<String>,
        body: String,
    }

    /// Serves one canned response per incoming connection, in order.
    struct StubServer {
        url: String,
        seen: Arc<Mutex<Vec<Seen>>>,
        handle: Option<JoinHandle<()>>,
    }

    impl StubServer {
        fn start(responses: Vec<(u16, &'static str)>) -> Self {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            let url = format!("http://{}", listener.local_addr().unwrap());
            let seen = Arc::new(Mutex::new(Vec::new()));
            let log = Arc::clone(&seen);

            let handle = thread::spawn(move || {
                for (status, body) in responses {
                    let (stream, _) = listener.accept().unwrap();
                    let mut reader = BufReader::new(stream);

                    let mut request_line = String::new();
                    reader.read_line(&mut request_line).unwrap();

                    let mut headers = Vec::new();
                    let mut content_length = 0;
                    loop {
                        let mut line = String::new();
                        reader.read_line(&mut line).unwrap();
                        let line = line.trim_end().to_string();
                        if line.is_empty() {
                            break;
                        }
                        if let Some(value) = line.to_ascii_lowercase().strip_prefix("content-length:") {
                            content_length = value.trim().parse().unwrap();
                        }
                        headers.push(line);
                    }

                    let mut payload = vec![0; content_length];
                    reader.read_exact(&mut payload).unwrap();

                    log.lock().unwrap().push(Seen {
                        request_line: request_line.trim_end().to_string(),
                        headers,
                        body: String::from_utf8(payload).unwrap(),
                    });

                    let mut stream = reader.into_inner();
                    write!(
                        stream,
                        "HTTP/1.1 {status} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                        body.len()
                    )
                    .unwrap();
                    stream.flush().unwrap();
                }
            });

            Self {
                url,
                seen,
                handle: Some(handle),
            }
        }

        fn finish(mut self) -> Vec<Seen> {
            if let Some(handle) = self.handle.take() {
                handle.join().unwrap();
            }
            self.seen.lock().unwrap().clone()
        }
    }

    const GAME_ROW: &str = r#"{"id":7,"name":null,"position":"Guard Pass","invariant":"Keep one knee in","task_player_a":"pass","task_player_b":"retain","differentiation":null,"created_at":"2025-01-02T10:00:00+00:00","updated_at":"2025-01-02T11:00:00+00:00"}"#;

    #[test]
    fn list_orders_by_creation_and_maps_columns() {
        let body = Box::leak(format!("[{GAME_ROW}]").into_boxed_str());
        let server = StubServer::start(vec![(200, body)]);
        let store = RemoteStore::connect(&server.url, "anon-key").unwrap();

        let games: Vec<Game> = store.list().unwrap();

        assert_eq!(games.len(), 1);
        let game = &games[0];
        assert_eq!(game.id, RecordId::new("7"));
        assert_eq!(game.name, "");
        assert_eq!(game.task_player_a, "pass");
        assert_eq!(game.task_player_b, "retain");
        assert!(game.updated_at > game.created_at);

        let seen = server.finish();
        assert!(seen[0].request_line.starts_with("GET /rest/v1/games?"));
        assert!(seen[0].request_line.contains("order=created_at.desc"));
        assert!(seen[0]
            .headers
            .iter()
            .any(|h| h.eq_ignore_ascii_case("apikey: anon-key")));
        assert!(seen[0]
            .headers
            .iter()
            .any(|h| h.eq_ignore_ascii_case("authorization: Bearer anon-key")));
    }

    #[test]
    fn create_sends_storage_columns() {
        let server = StubServer::start(vec![(201, GAME_ROW)]);
        let store = RemoteStore::connect(&server.url, "key").unwrap();

        let draft = GameDraft {
            task_player_a: "pass".to_string(),
            ..GameDraft::new("Guard Pass")
        };
        let game: Game = store.create(draft).unwrap();
        assert_eq!(game.id.as_str(), "7");

        let seen = server.finish();
        assert!(seen[0].request_line.starts_with("POST /rest/v1/games"));
        let body: Value = serde_json::from_str(&seen[0].body).unwrap();
        assert_eq!(body["task_player_a"], "pass");
        assert_eq!(body["position"], "Guard Pass");
        assert!(body.get("taskPlayerA").is_none());
    }

    #[test]
    fn update_sends_only_present_columns() {
        let server = StubServer::start(vec![(200, GAME_ROW)]);
        let store = RemoteStore::connect(&server.url, "key").unwrap();

        let patch = GamePatch {
            invariant: Some("Keep one knee in".to_string()),
            ..GamePatch::default()
        };
        let _: Game = store.update(&RecordId::new("7"), patch).unwrap();

        let seen = server.finish();
        assert!(seen[0].request_line.starts_with("PATCH /rest/v1/games?id=eq.7"));
        let body: Value = serde_json::from_str(&seen[0].body).unwrap();
        assert_eq!(body, json!({"invariant": "Keep one knee in"}));
    }

    #[test]
    fn lesson_rows_map_game_ids_and_duration() {
        let row = r#"{"id":"l1","name":"Passing","description":null,"duration":45,"level":"Advanced","notes":"","game_ids":[3,1,3],"created_at":"2025-01-02T10:00:00Z","updated_at":"2025-01-02T10:00:00Z"}"#;
        let server = StubServer::start(vec![(201, row)]);
        let store = RemoteStore::connect(&server.url, "key").unwrap();

        let draft = LessonDraft {
            duration: Some("45".to_string()),
            ..LessonDraft::new(
                "Passing",
                vec![RecordId::new("3"), RecordId::new("1"), RecordId::new("3")],
            )
        };
        let lesson: Lesson = store.create(draft).unwrap();

        assert_eq!(lesson.duration, Some(45));
        assert_eq!(
            lesson.game_ids,
            vec![RecordId::new("3"), RecordId::new("1"), RecordId::new("3")]
        );

        let seen = server.finish();
        let body: Value = serde_json::from_str(&seen[0].body).unwrap();
        assert_eq!(body["duration"], 45);
        assert_eq!(body["game_ids"], json!(["3", "1", "3"]));
    }

    #[test]
    fn error_status_surfaces_message() {
        let server = StubServer::start(vec![(
            401,
            r#"{"message":"Invalid API key","hint":"Double check your key"}"#,
        )]);
        let store = RemoteStore::connect(&server.url, "wrong").unwrap();

        let result: Result<Game, _> = store.create(GameDraft::new("Guard"));

        match result {
            Err(StoreError::Remote { status, message }) => {
                assert_eq!(status, 401);
                assert_eq!(message, "Invalid API key (Double check your key)");
            }
            other => panic!("expected a remote error, got {other:?}"),
        }
        server.finish();
    }

    #[test]
    fn delete_filters_by_id() {
        let server = StubServer::start(vec![(204, "")]);
        let store = RemoteStore::connect(&server.url, "key").unwrap();

        Store::<Lesson>::delete(&store, &RecordId::new("abc")).unwrap();

        let seen = server.finish();
        assert!(seen[0]
            .request_line
            .starts_with("DELETE /rest/v1/lessons?id=eq.abc"));
    }

    #[test]
    fn probe_reports_unreachable_store() {
        // Bind then drop a listener so the port is very likely closed.
        let port = TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let store = RemoteStore::connect(&format!("http://127.0.0.1:{port}"), "key").unwrap();
        assert!(matches!(store.probe(), Err(StoreError::Transport(_))));
    }

    #[test]
    fn connect_rejects_non_http_endpoints() {
        assert!(matches!(
            RemoteStore::connect("ftp://example.org", "key"),
            Err(StoreError::Endpoint(_))
        ));
        assert!(matches!(
            RemoteStore::connect("not a url", "key"),
            Err(StoreError::Endpoint(_))
        ));
    }

    #[test]
    fn patch_columns_include_cleared_duration() {
        let patch = LessonPatch {
            duration: Some(String::new()),
            ..LessonPatch::default()
        };
        assert_eq!(Lesson::patch_columns(&patch), json!({"duration": null}));
    }
}
