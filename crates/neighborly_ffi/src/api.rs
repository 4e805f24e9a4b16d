//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose stable, use-case-level functions to Dart via FRB.
//! - Own targeting and post-edit sessions behind numeric handles.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Sessions live in thread-local registries; every call is sync and is
//!   expected on the UI isolate thread that opened the session.
//! - Unknown or closed handles produce failure envelopes, never panics.

use log::info;
use neighborly_core::db::open_db;
use neighborly_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, parse_roster_json,
    ping as ping_inner, BlobHouseholdDirectory, BlobPostRepository, FilterCriteria, GeoPoint,
    HouseholdDirectory, HouseholdRow, Post, PostDraft, PostEditSession, PostService, RepoError,
    SelectionLayer, SessionOptions, SqliteBlobStore, TargetingSession,
};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use uuid::Uuid;

const DB_FILE_NAME: &str = "neighborly_targeting.sqlite3";
static DB_PATH: OnceLock<PathBuf> = OnceLock::new();
static NEXT_HANDLE: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static TARGETING_SESSIONS: RefCell<HashMap<u64, TargetingSession>> =
        RefCell::new(HashMap::new());
    static EDIT_SESSIONS: RefCell<HashMap<u64, PostEditSession>> = RefCell::new(HashMap::new());
}

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Reconfiguration attempts with different level or directory return error.
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// One household row in picker display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetingRow {
    pub household_id: String,
    pub display_name: String,
    pub neighborhood: Option<String>,
    /// Preformatted distance badge; `None` hides the badge.
    pub distance_label: Option<String>,
    pub is_match: bool,
    pub is_clicked: bool,
    pub is_selected: bool,
}

/// Full picker state after a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetingSnapshot {
    pub session_id: u64,
    pub roster_loaded: bool,
    pub rows: Vec<TargetingRow>,
    /// Effective selection, sorted by id.
    pub selected_ids: Vec<String>,
    /// Active layers (`clicked|matches|additional|all`).
    pub active_layers: Vec<String>,
    /// Layers whose candidate set is non-empty.
    pub enabled_layers: Vec<String>,
    pub match_count: u32,
    pub additional_count: u32,
}

/// Response envelope for targeting calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetingResponse {
    /// Whether the call reached a live session.
    pub ok: bool,
    /// Whether the call changed session state.
    pub changed: bool,
    /// Human-readable response message for diagnostics.
    pub message: String,
    pub snapshot: Option<TargetingSnapshot>,
}

impl TargetingResponse {
    fn success(message: impl Into<String>, changed: bool, snapshot: TargetingSnapshot) -> Self {
        Self {
            ok: true,
            changed,
            message: message.into(),
            snapshot: Some(snapshot),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            changed: false,
            message: message.into(),
            snapshot: None,
        }
    }
}

/// Response envelope for post create/save calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostActionResponse {
    pub ok: bool,
    pub post_id: Option<String>,
    /// Persisted recipients in stored order.
    pub recipients: Vec<String>,
    pub message: String,
}

impl PostActionResponse {
    fn success(message: impl Into<String>, post: &Post) -> Self {
        Self {
            ok: true,
            post_id: Some(post.id.to_string()),
            recipients: post.recipients.clone(),
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            post_id: None,
            recipients: Vec::new(),
            message: message.into(),
        }
    }
}

/// Response envelope for post-edit session calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostEditResponse {
    pub ok: bool,
    pub edit_id: Option<u64>,
    pub changed: bool,
    /// Recipients fixed at edit start; rendered checked and disabled.
    pub locked_recipients: Vec<String>,
    /// Recipients added during this edit.
    pub mutable_recipients: Vec<String>,
    pub message: String,
}

impl PostEditResponse {
    fn success(
        message: impl Into<String>,
        edit_id: u64,
        changed: bool,
        edit: &PostEditSession,
    ) -> Self {
        Self {
            ok: true,
            edit_id: Some(edit_id),
            changed,
            locked_recipients: edit
                .lock()
                .locked_recipients()
                .map(<[String]>::to_vec)
                .unwrap_or_default(),
            mutable_recipients: edit.lock().mutable_recipients().to_vec(),
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            edit_id: None,
            changed: false,
            locked_recipients: Vec::new(),
            mutable_recipients: Vec::new(),
            message: message.into(),
        }
    }
}

/// Replaces the stored household roster with a JSON array of directory records.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Malformed JSON leaves the stored roster untouched.
#[flutter_rust_bridge::frb(sync)]
pub fn directory_import_roster(roster_json: String) -> String {
    let result = parse_roster_json(roster_json.as_str()).and_then(|records| {
        let conn = open_db(resolve_db_path()).map_err(RepoError::from)?;
        BlobHouseholdDirectory::new(SqliteBlobStore::new(&conn)).save_records(&records)?;
        Ok(records.len())
    });
    match result {
        Ok(count) => {
            info!("event=roster_import module=ffi status=ok records={count}");
            String::new()
        }
        Err(err) => format!("directory_import_roster failed: {err}"),
    }
}

/// Opens a targeting session.
///
/// Input semantics:
/// - viewer coordinates are used only when both are present and in range.
/// - `clicked_household_id` is the household the user arrived from, if any.
///
/// The roster starts empty; call `targeting_load_roster` next.
#[flutter_rust_bridge::frb(sync)]
pub fn targeting_open(
    viewer_lat: Option<f64>,
    viewer_lon: Option<f64>,
    clicked_household_id: Option<String>,
) -> TargetingResponse {
    let viewer = match (viewer_lat, viewer_lon) {
        (Some(lat), Some(lon)) => GeoPoint::new(lat, lon),
        _ => None,
    };
    let session = TargetingSession::new(SessionOptions {
        viewer,
        clicked_household: clicked_household_id,
        ..SessionOptions::default()
    });
    let session_id = next_handle();
    let initial = snapshot(session_id, &session);
    TARGETING_SESSIONS.with(|sessions| sessions.borrow_mut().insert(session_id, session));
    info!("event=targeting_open module=ffi status=ok session_id={session_id}");
    TargetingResponse::success("Targeting session opened.", true, initial)
}

/// Fetches the roster from the local directory into a session.
///
/// A failing directory applies as an empty roster; the response message
/// carries the failure.
#[flutter_rust_bridge::frb(sync)]
pub fn targeting_load_roster(session_id: u64) -> TargetingResponse {
    with_targeting(session_id, |session| {
        let ticket = session.begin_roster_load();
        let fetched = open_db(resolve_db_path())
            .map_err(RepoError::from)
            .and_then(|conn| {
                BlobHouseholdDirectory::new(SqliteBlobStore::new(&conn)).fetch_roster()
            });
        let message = match &fetched {
            Ok(households) => format!("Loaded {} household(s).", households.len()),
            Err(err) => format!("targeting_load_roster failed: {err}"),
        };
        session.complete_roster_load(ticket, fetched);
        (message, true)
    })
}

/// Replaces the session filter.
///
/// Input semantics:
/// - `household_types`: free-form type labels (normalized like directory data).
/// - `age_min`/`age_max`: inclusive bounds; both `None` disables the clause.
/// - `gender`: `all|girls|boys`.
#[flutter_rust_bridge::frb(sync)]
pub fn targeting_set_filter(
    session_id: u64,
    household_types: Vec<String>,
    age_min: Option<u32>,
    age_max: Option<u32>,
    gender: String,
) -> TargetingResponse {
    let criteria =
        match FilterCriteria::from_parts(&household_types, age_min, age_max, gender.as_str()) {
            Ok(criteria) => criteria,
            Err(err) => {
                return TargetingResponse::failure(format!("targeting_set_filter failed: {err}"))
            }
        };
    with_targeting(session_id, |session| {
        session.set_filter(criteria);
        ("Filter applied.".to_string(), true)
    })
}

/// Flips manual selection of one household.
#[flutter_rust_bridge::frb(sync)]
pub fn targeting_toggle_household(session_id: u64, household_id: String) -> TargetingResponse {
    with_targeting(session_id, |session| {
        let changed = session.toggle_household(household_id.as_str());
        let message = if changed {
            "Household toggled."
        } else {
            "Household not in roster."
        };
        (message.to_string(), changed)
    })
}

/// Flips one bulk layer (`clicked|matches|additional|all`).
#[flutter_rust_bridge::frb(sync)]
pub fn targeting_toggle_layer(session_id: u64, layer: String) -> TargetingResponse {
    let Some(parsed) = SelectionLayer::parse(layer.as_str()) else {
        return TargetingResponse::failure(format!("unknown selection layer: {layer}"));
    };
    with_targeting(session_id, |session| {
        let changed = session.toggle_layer(parsed);
        let message = if changed {
            format!("Layer {} toggled.", parsed.as_str())
        } else {
            format!("Layer {} has no candidates.", parsed.as_str())
        };
        (message, changed)
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn targeting_select_all(session_id: u64) -> TargetingResponse {
    with_targeting(session_id, |session| {
        let changed = session.select_all();
        ("Select all applied.".to_string(), changed)
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn targeting_clear_all(session_id: u64) -> TargetingResponse {
    with_targeting(session_id, |session| {
        session.clear_all();
        ("Selection cleared.".to_string(), true)
    })
}

/// Returns current picker state without mutating it.
#[flutter_rust_bridge::frb(sync)]
pub fn targeting_snapshot(session_id: u64) -> TargetingResponse {
    with_targeting(session_id, |_| ("Snapshot.".to_string(), false))
}

/// Disposes a targeting session; later calls with the same handle fail.
#[flutter_rust_bridge::frb(sync)]
pub fn targeting_close(session_id: u64) -> TargetingResponse {
    let removed = TARGETING_SESSIONS.with(|sessions| sessions.borrow_mut().remove(&session_id));
    match removed {
        Some(mut session) => {
            session.dispose();
            info!("event=targeting_close module=ffi status=ok session_id={session_id}");
            TargetingResponse {
                ok: true,
                changed: true,
                message: "Targeting session closed.".to_string(),
                snapshot: None,
            }
        }
        None => unknown_session(session_id),
    }
}

/// Creates a post or event addressed to a session's effective selection.
///
/// Input semantics:
/// - `event_start_epoch_ms = Some(..)` creates an event, otherwise a post.
/// - The targeting session stays open; close it separately.
#[flutter_rust_bridge::frb(sync)]
pub fn post_create(
    session_id: u64,
    title: String,
    body: String,
    event_start_epoch_ms: Option<i64>,
    event_end_epoch_ms: Option<i64>,
) -> PostActionResponse {
    let Some(audience) = TARGETING_SESSIONS.with(|sessions| {
        sessions
            .borrow()
            .get(&session_id)
            .map(TargetingSession::effective_selection)
    }) else {
        return PostActionResponse::failure(format!("unknown targeting session: {session_id}"));
    };

    let draft = match event_start_epoch_ms {
        Some(start) => PostDraft {
            body,
            ..PostDraft::event(title, start, event_end_epoch_ms)
        },
        None => PostDraft::post(title, body),
    };
    match with_post_service(|service| {
        service
            .create_post(draft, &audience)
            .map_err(|err| err.to_string())
    }) {
        Ok(post) => PostActionResponse::success("Post created.", &post),
        Err(err) => PostActionResponse::failure(format!("post_create failed: {err}")),
    }
}

/// Opens an edit session; current recipients become locked.
#[flutter_rust_bridge::frb(sync)]
pub fn post_edit_open(post_id: String) -> PostEditResponse {
    let id = match Uuid::parse_str(post_id.trim()) {
        Ok(id) => id,
        Err(err) => return PostEditResponse::failure(format!("invalid post id: {err}")),
    };
    match with_post_service(|service| service.begin_edit(id).map_err(|err| err.to_string())) {
        Ok(edit) => {
            let edit_id = next_handle();
            let response = PostEditResponse::success("Edit session opened.", edit_id, true, &edit);
            EDIT_SESSIONS.with(|edits| edits.borrow_mut().insert(edit_id, edit));
            response
        }
        Err(err) => PostEditResponse::failure(format!("post_edit_open failed: {err}")),
    }
}

/// Toggles one added recipient; locked recipients are no-ops.
#[flutter_rust_bridge::frb(sync)]
pub fn post_edit_toggle(edit_id: u64, recipient: String) -> PostEditResponse {
    EDIT_SESSIONS.with(|edits| match edits.borrow_mut().get_mut(&edit_id) {
        Some(edit) => {
            let changed = edit.toggle_recipient(recipient.as_str());
            let message = if changed {
                "Recipient toggled."
            } else {
                "Recipient is locked."
            };
            PostEditResponse::success(message, edit_id, changed, edit)
        }
        None => PostEditResponse::failure(format!("unknown edit session: {edit_id}")),
    })
}

/// Saves and closes an edit session.
#[flutter_rust_bridge::frb(sync)]
pub fn post_edit_save(edit_id: u64) -> PostActionResponse {
    let Some(edit) = EDIT_SESSIONS.with(|edits| edits.borrow_mut().remove(&edit_id)) else {
        return PostActionResponse::failure(format!("unknown edit session: {edit_id}"));
    };
    match with_post_service(|service| service.save_edit(edit).map_err(|err| err.to_string())) {
        Ok(post) => PostActionResponse::success("Recipients saved.", &post),
        Err(err) => PostActionResponse::failure(format!("post_edit_save failed: {err}")),
    }
}

/// Discards and closes an edit session without writing.
#[flutter_rust_bridge::frb(sync)]
pub fn post_edit_cancel(edit_id: u64) -> PostEditResponse {
    let Some(edit) = EDIT_SESSIONS.with(|edits| edits.borrow_mut().remove(&edit_id)) else {
        return PostEditResponse::failure(format!("unknown edit session: {edit_id}"));
    };
    info!(
        "event=post_edit_cancel module=ffi status=discarded post_id={} edit_id={edit_id} discarded={}",
        edit.post_id(),
        edit.lock().mutable_recipients().len()
    );
    PostEditResponse::success("Edit cancelled.", edit_id, false, &edit)
}

fn next_handle() -> u64 {
    NEXT_HANDLE.fetch_add(1, Ordering::Relaxed)
}

fn with_targeting(
    session_id: u64,
    f: impl FnOnce(&mut TargetingSession) -> (String, bool),
) -> TargetingResponse {
    TARGETING_SESSIONS.with(|sessions| {
        let mut sessions = sessions.borrow_mut();
        match sessions.get_mut(&session_id) {
            Some(session) => {
                let (message, changed) = f(session);
                TargetingResponse::success(message, changed, snapshot(session_id, session))
            }
            None => unknown_session(session_id),
        }
    })
}

fn unknown_session(session_id: u64) -> TargetingResponse {
    TargetingResponse::failure(format!("unknown targeting session: {session_id}"))
}

fn snapshot(session_id: u64, session: &TargetingSession) -> TargetingSnapshot {
    let engine = session.engine();
    TargetingSnapshot {
        session_id,
        roster_loaded: session.is_roster_loaded(),
        rows: session.rows().into_iter().map(to_targeting_row).collect(),
        selected_ids: session.effective_selection().into_iter().collect(),
        active_layers: engine
            .active_layers()
            .iter()
            .map(|layer| layer.as_str().to_string())
            .collect(),
        enabled_layers: SelectionLayer::ALL_LAYERS
            .iter()
            .filter(|layer| engine.layer_enabled(**layer))
            .map(|layer| layer.as_str().to_string())
            .collect(),
        match_count: saturating_count(session.index().match_ids().len()),
        additional_count: saturating_count(session.index().additional_ids().len()),
    }
}

fn saturating_count(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

fn to_targeting_row(row: HouseholdRow) -> TargetingRow {
    TargetingRow {
        household_id: row.id,
        display_name: row.display_name,
        neighborhood: row.neighborhood,
        distance_label: row.distance_label,
        is_match: row.is_match,
        is_clicked: row.is_clicked,
        is_selected: row.is_selected,
    }
}

fn resolve_db_path() -> PathBuf {
    DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var("NEIGHBORLY_DB_PATH") {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(DB_FILE_NAME)
        })
        .clone()
}

fn with_post_service<T>(
    f: impl FnOnce(&PostService<BlobPostRepository<SqliteBlobStore<'_>>>) -> Result<T, String>,
) -> Result<T, String> {
    let conn = open_db(resolve_db_path()).map_err(|err| format!("DB open failed: {err}"))?;
    let service = PostService::new(BlobPostRepository::new(SqliteBlobStore::new(&conn)));
    f(&service)
}
