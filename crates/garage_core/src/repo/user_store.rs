//! User store backed by one JSON document file.
//!
//! # Responsibility
//! - Persist the whole user collection as a single pretty-printed JSON array.
//! - Emulate a transactional store with whole-file read-modify-write cycles.
//!
//! # Invariants
//! - Every mutation runs its full read-modify-write span under [`FileLock`].
//! - The data file is only ever replaced wholesale (temp file + rename), so
//!   lock-free readers never observe a partial write.
//! - A missing, empty, or malformed file reads as an empty collection. The
//!   malformed case is logged; any other I/O failure is returned.
//! - Only a file that is not a JSON array counts as malformed. Inside an
//!   array each object is decoded on its own and never discards the rest.
//! - Collection order is insertion order.

use crate::model::user::{User, UserPatch};
use crate::model::validation::Validate;
use crate::model::RecordId;
use crate::repo::file_lock::FileLock;
use crate::repo::id_alloc::{next_id, IdPolicy};
use crate::repo::{RecordStore, RepoError, RepoResult};
use log::{debug, error, warn};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;
use std::ffi::OsString;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

const JSON_INDENT: &[u8] = b"    ";

/// Why a file's bytes did not decode into a collection.
#[derive(Debug)]
enum DecodeIssue {
    Blank,
    Malformed(serde_json::Error),
}

/// Users decoded from an array, plus how many non-object elements were dropped.
#[derive(Debug)]
struct Decoded {
    users: Vec<User>,
    skipped: usize,
}

/// Flat-file user repository.
#[derive(Debug, Clone)]
pub struct JsonFileUserStore {
    path: PathBuf,
    id_policy: IdPolicy,
}

impl JsonFileUserStore {
    /// Prepares a store for the JSON file at `path`.
    ///
    /// Creates the parent directory when needed. The data file itself is
    /// created by the first write.
    pub fn open(path: impl AsRef<Path>, id_policy: IdPolicy) -> RepoResult<Self> {
        let path = path.as_ref();
        let parent = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent).map_err(|source| io_error(&parent, source))?;
        let parent = fs::canonicalize(&parent).map_err(|source| io_error(&parent, source))?;
        let file_name = path.file_name().ok_or_else(|| {
            io_error(
                path,
                io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"),
            )
        })?;

        Ok(Self {
            path: parent.join(file_name),
            id_policy,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn id_policy(&self) -> IdPolicy {
        self.id_policy
    }

    /// Appends `user` with a freshly allocated id and returns the stored copy.
    ///
    /// Any id already carried by `user` is ignored.
    pub fn create(&self, user: &User) -> RepoResult<User> {
        user.validate().into_result()?;

        let policy = self.id_policy;
        self.mutate("create", |users| {
            let id = next_id(policy, users.iter().map(|existing| existing.id)).ok_or_else(|| {
                RepoError::IdsExhausted {
                    path: self.path.clone(),
                }
            })?;
            let mut stored = user.clone();
            stored.extra.remove("id");
            stored.id = Some(id);
            users.push(stored.clone());
            Ok((stored, true))
        })
    }

    /// Reads the collection, applying the empty-on-missing/malformed policy.
    fn load(&self) -> RepoResult<Vec<User>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(io_error(&self.path, err)),
        };

        match decode(&bytes) {
            Ok(Decoded { users, skipped }) => {
                if skipped > 0 {
                    warn!(
                        "event=user_store_read module=repo status=partial reason=non_object_elements skipped={} path={}",
                        skipped,
                        self.path.display()
                    );
                }
                Ok(users)
            }
            Err(DecodeIssue::Blank) => Ok(Vec::new()),
            Err(DecodeIssue::Malformed(err)) => {
                warn!(
                    "event=user_store_read module=repo status=fallback reason=malformed_json path={} error={}",
                    self.path.display(),
                    err
                );
                Ok(Vec::new())
            }
        }
    }

    /// Replaces the data file with `users`.
    fn store(&self, users: &[User]) -> RepoResult<()> {
        let bytes = encode(users)?;
        let temp_path = temp_path_for(&self.path);

        let replaced = write_synced(&temp_path, &bytes)
            .map_err(|source| io_error(&temp_path, source))
            .and_then(|()| {
                fs::rename(&temp_path, &self.path).map_err(|source| io_error(&self.path, source))
            });
        if replaced.is_err() {
            discard_temp(&temp_path);
        }
        replaced
    }

    /// Runs one locked read-modify-write cycle.
    ///
    /// `change` returns the caller's result and whether the collection must be
    /// written back.
    fn mutate<T>(
        &self,
        op: &'static str,
        change: impl FnOnce(&mut Vec<User>) -> RepoResult<(T, bool)>,
    ) -> RepoResult<T> {
        let started_at = Instant::now();
        match self.locked_cycle(change) {
            Ok((value, dirty, count)) => {
                debug!(
                    "event=user_store_write module=repo status=ok op={} written={} count={} duration_ms={}",
                    op,
                    dirty,
                    count,
                    started_at.elapsed().as_millis()
                );
                Ok(value)
            }
            Err(err) => {
                error!(
                    "event=user_store_write module=repo status=error op={} duration_ms={} error={}",
                    op,
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }

    fn locked_cycle<T>(
        &self,
        change: impl FnOnce(&mut Vec<User>) -> RepoResult<(T, bool)>,
    ) -> RepoResult<(T, bool, usize)> {
        let _lock = FileLock::acquire(&self.path)?;
        let mut users = self.load()?;
        let (value, dirty) = change(&mut users)?;
        if dirty {
            self.store(&users)?;
        }
        Ok((value, dirty, users.len()))
    }
}

impl RecordStore for JsonFileUserStore {
    type Record = User;
    type Patch = UserPatch;

    fn list(&self) -> RepoResult<Vec<User>> {
        self.load()
    }

    fn get(&self, id: RecordId) -> RepoResult<Option<User>> {
        Ok(self.load()?.into_iter().find(|user| user.id == Some(id)))
    }

    fn save(&self, user: &mut User) -> RepoResult<()> {
        let Some(id) = user.id else {
            let stored = self.create(user)?;
            user.id = stored.id;
            return Ok(());
        };

        user.validate().into_result()?;
        let replacement: &User = user;
        self.mutate("save", |users| {
            let mut changed = false;
            for stored in users.iter_mut().filter(|stored| stored.id == Some(id)) {
                stored.replace_fields(replacement);
                changed = true;
            }
            Ok(((), changed))
        })
    }

    /// Patches every record carrying `id` (ids are unique unless the file was
    /// edited by hand) and returns the first one.
    fn update(&self, id: RecordId, patch: &UserPatch) -> RepoResult<Option<User>> {
        patch.validate().into_result()?;

        self.mutate("update", |users| {
            let mut updated: Option<User> = None;
            for stored in users.iter_mut().filter(|stored| stored.id == Some(id)) {
                patch.apply(stored);
                if updated.is_none() {
                    updated = Some(stored.clone());
                }
            }
            let dirty = updated.is_some();
            Ok((updated, dirty))
        })
    }

    fn delete(&self, id: RecordId) -> RepoResult<bool> {
        self.mutate("delete", |users| {
            let before = users.len();
            users.retain(|user| user.id != Some(id));
            let removed = users.len() != before;
            Ok((removed, removed))
        })
    }
}

fn decode(bytes: &[u8]) -> Result<Decoded, DecodeIssue> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(DecodeIssue::Blank);
    }
    let elements: Vec<Value> = serde_json::from_slice(bytes).map_err(DecodeIssue::Malformed)?;

    let mut decoded = Decoded {
        users: Vec::with_capacity(elements.len()),
        skipped: 0,
    };
    for element in elements {
        match element {
            Value::Object(fields) => decoded.users.push(User::from_stored(fields)),
            _ => decoded.skipped += 1,
        }
    }
    Ok(decoded)
}

fn encode(users: &[User]) -> RepoResult<Vec<u8>> {
    let mut bytes = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut bytes, PrettyFormatter::with_indent(JSON_INDENT));
    users.serialize(&mut serializer)?;
    Ok(bytes)
}

fn write_synced(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

/// Best-effort removal of a temp file left by a failed replace.
fn discard_temp(temp_path: &Path) {
    match fs::remove_file(temp_path) {
        Ok(()) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => warn!(
            "event=user_store_cleanup module=repo status=error path={} error={}",
            temp_path.display(),
            err
        ),
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn io_error(path: &Path, source: io::Error) -> RepoError {
    RepoError::Io {
        path: path.to_path_buf(),
        source,
    }
}
