//! Directory queries
//!
//! Lists active casts, optionally restricted to the casts protected by a
//! given password, most-watched first.

use crate::cast::CastSession;

/// One row of a directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    /// Cast display name
    pub display_name: String,
    /// Number of viewers when the query ran
    pub viewer_count: usize,
    /// Whether joining requires a password
    pub password_protected: bool,
}

impl DirectoryEntry {
    /// Project a session into a listing row
    pub fn from_session(session: &CastSession) -> Self {
        Self {
            display_name: session.name().to_owned(),
            viewer_count: session.viewer_count(),
            password_protected: session.is_password_protected(),
        }
    }
}

/// Answer to a directory request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryReply {
    /// Matching casts, most viewers first
    Casts(Vec<DirectoryEntry>),
    /// Nothing matched
    NoneAvailable {
        /// The request carried a password
        with_password: bool,
    },
    /// Live casting is switched off
    Disabled,
}

impl DirectoryReply {
    /// Text the login protocol shows instead of a list
    pub fn message(&self) -> Option<&'static str> {
        match self {
            DirectoryReply::Casts(_) => None,
            DirectoryReply::NoneAvailable { with_password: true } => {
                Some("No cast available with this password.")
            }
            DirectoryReply::NoneAvailable {
                with_password: false,
            } => Some("No cast available."),
            DirectoryReply::Disabled => Some("Invalid account name."),
        }
    }

    /// Listed casts; empty for the non-list replies
    pub fn entries(&self) -> &[DirectoryEntry] {
        match self {
            DirectoryReply::Casts(entries) => entries,
            _ => &[],
        }
    }
}

/// Answers "which casts are live" requests
#[derive(Debug, Clone)]
pub struct DirectoryQueryService {
    enabled: bool,
}

impl DirectoryQueryService {
    /// Create a query service; a disabled service answers every request with
    /// [`DirectoryReply::Disabled`]
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// List active casts
    ///
    /// Without a password (or with an empty one) every active cast is listed.
    /// With a password only casts protected by exactly that password are
    /// listed; open casts are left out. Entries are ordered by viewer count,
    /// descending; ties keep the order of `casts`.
    pub fn list<'a, I>(&self, casts: I, password: Option<&str>) -> Vec<DirectoryEntry>
    where
        I: IntoIterator<Item = &'a CastSession>,
    {
        let password = password.filter(|p| !p.is_empty());

        let mut entries: Vec<DirectoryEntry> = casts
            .into_iter()
            .filter(|session| session.is_active())
            .filter(|session| match password {
                Some(password) => session.is_password_protected() && session.password() == password,
                None => true,
            })
            .map(DirectoryEntry::from_session)
            .collect();

        // sort_by is stable
        entries.sort_by(|a, b| b.viewer_count.cmp(&a.viewer_count));
        entries
    }

    /// List active casts and wrap the result for the login protocol
    pub fn query<'a, I>(&self, casts: I, password: Option<&str>) -> DirectoryReply
    where
        I: IntoIterator<Item = &'a CastSession>,
    {
        if !self.enabled {
            return DirectoryReply::Disabled;
        }

        let entries = self.list(casts, password);
        if entries.is_empty() {
            DirectoryReply::NoneAvailable {
                with_password: password.is_some_and(|p| !p.is_empty()),
            }
        } else {
            DirectoryReply::Casts(entries)
        }
    }
}
