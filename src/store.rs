//! In-memory tables and application state
//!
//! All service state lives here: the link table, the user table, and the
//! distinct-visitor audit trail. The three tables sit behind a single
//! `RwLock` so that identifier allocation can check every namespace and
//! insert the winner in one critical section, and so concurrent redirects
//! of the same code cannot drop counter increments.
//!
//! Nothing is persisted; the process starts empty and state is lost on
//! restart.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::generator::generate_code;
use crate::model::{ShortLink, User, VisitEntry};
use crate::session::Sessions;

/// Application state shared across all request handlers
#[derive(Clone)]
pub struct AppState {
    /// The in-memory tables
    pub store: Arc<MemoryStore>,

    /// Session token signing service
    pub sessions: Arc<Sessions>,
}

/// Everything guarded by the store lock
#[derive(Default)]
struct Tables {
    /// Short code -> link record
    links: HashMap<String, ShortLink>,

    /// User id -> account record
    users: HashMap<String, User>,

    /// Short code -> distinct-visitor audit trail
    visits: HashMap<String, Vec<VisitEntry>>,

    /// Every visitor id ever handed out, kept so the generator namespace
    /// stays collision-free even after a link (and its trail) is deleted
    visitor_ids: HashSet<String>,
}

impl Tables {
    /// True when an id exists in any namespace: link codes, user ids, visitor ids
    fn id_taken(&self, id: &str) -> bool {
        self.links.contains_key(id) || self.users.contains_key(id) || self.visitor_ids.contains(id)
    }
}

/// The in-memory store owning the link, user, and visit tables
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
        }
    }

    /// Creates a link under a freshly allocated code
    ///
    /// The code is generated and inserted under one write lock, so no other
    /// request can observe or claim the candidate in between. Counters start
    /// at zero.
    pub fn create_link(
        &self,
        destination: &str,
        owner_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> ShortLink {
        let mut tables = self.tables.write();
        let code = generate_code(|c| tables.id_taken(c));

        let link = ShortLink {
            code: code.clone(),
            destination_url: normalize_destination(destination),
            owner_id: owner_id.map(str::to_string),
            created_at: now,
            total_views: 0,
            unique_views: 0,
        };
        tables.links.insert(code, link.clone());

        link
    }

    /// Replaces a link's destination
    ///
    /// The creation timestamp is reset; view counters persist across edits.
    /// Returns `None` when the code does not exist.
    pub fn update_link(
        &self,
        code: &str,
        destination: &str,
        now: DateTime<Utc>,
    ) -> Option<ShortLink> {
        let mut tables = self.tables.write();
        let link = tables.links.get_mut(code)?;

        link.destination_url = normalize_destination(destination);
        link.created_at = now;

        Some(link.clone())
    }

    /// Removes a link and its visit trail; deleting an absent code is a no-op
    pub fn delete_link(&self, code: &str) {
        let mut tables = self.tables.write();
        tables.links.remove(code);
        tables.visits.remove(code);
    }

    pub fn get_link(&self, code: &str) -> Option<ShortLink> {
        self.tables.read().links.get(code).cloned()
    }

    /// All links owned by the given user, keyed by code
    pub fn links_for_owner(&self, owner_id: &str) -> BTreeMap<String, ShortLink> {
        self.tables
            .read()
            .links
            .iter()
            .filter(|(_, link)| link.owner_id.as_deref() == Some(owner_id))
            .map(|(code, link)| (code.clone(), link.clone()))
            .collect()
    }

    /// The full link table, keyed by code
    pub fn all_links(&self) -> BTreeMap<String, ShortLink> {
        self.tables
            .read()
            .links
            .iter()
            .map(|(code, link)| (code.clone(), link.clone()))
            .collect()
    }

    /// The distinct-visitor audit trail for a code
    pub fn visits_for(&self, code: &str) -> Vec<VisitEntry> {
        self.tables
            .read()
            .visits
            .get(code)
            .cloned()
            .unwrap_or_default()
    }

    /// Records one redirect traversal, returning the destination URL
    ///
    /// Every traversal bumps `total_views`. When `first_visit` is set (the
    /// session has no record of this code), `unique_views` is bumped as well
    /// and an audit entry with a freshly generated visitor id is appended.
    /// Returns `None`, mutating nothing, when the code does not exist.
    pub fn record_visit(
        &self,
        code: &str,
        first_visit: bool,
        now: DateTime<Utc>,
    ) -> Option<String> {
        let mut tables = self.tables.write();

        let destination = {
            let link = tables.links.get_mut(code)?;
            link.total_views += 1;
            if first_visit {
                link.unique_views += 1;
            }
            link.destination_url.clone()
        };

        if first_visit {
            let visitor_id = generate_code(|c| tables.id_taken(c));
            tables.visitor_ids.insert(visitor_id.clone());
            tables.visits.entry(code.to_string()).or_default().push(VisitEntry {
                visitor_id,
                visited_at: now,
            });
        }

        Some(destination)
    }

    /// Registers an account under a freshly allocated id
    ///
    /// Email uniqueness is checked under the same write lock as the insert.
    /// Returns `None` when the email is already registered.
    pub fn create_user(
        &self,
        email: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Option<User> {
        let mut tables = self.tables.write();
        if tables.users.values().any(|user| user.email == email) {
            return None;
        }

        let id = generate_code(|c| tables.id_taken(c));
        let user = User {
            id: id.clone(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: now,
        };
        tables.users.insert(id, user.clone());

        Some(user)
    }

    pub fn get_user(&self, id: &str) -> Option<User> {
        self.tables.read().users.get(id).cloned()
    }

    pub fn find_user_by_email(&self, email: &str) -> Option<User> {
        self.tables
            .read()
            .users
            .values()
            .find(|user| user.email == email)
            .cloned()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Prepends "http://" when the destination has no scheme
///
/// A scheme is one or more word characters followed by "://"; anything else
/// (including a bare "://host") gets the prefix. Already-schemed inputs pass
/// through unchanged, so normalization is idempotent.
pub fn normalize_destination(raw: &str) -> String {
    if has_scheme(raw) {
        raw.to_string()
    } else {
        format!("http://{}", raw)
    }
}

fn has_scheme(s: &str) -> bool {
    match s.find("://") {
        Some(idx) if idx > 0 => s[..idx]
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_'),
        _ => false,
    }
}
