//! Access-control types for S3 objects.
//!
//! An [`AccessPolicy`] is the owner of an object plus its ordered list of
//! [`Grant`]s. The service treats a policy write as a full replacement, so
//! callers that want to add a grant must submit the existing grants too.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// URI of the predefined group that matches every requester.
pub const ALL_USERS_GROUP_URI: &str = "http://acs.amazonaws.com/groups/global/AllUsers";

// ---------------------------------------------------------------------------
// Owner
// ---------------------------------------------------------------------------

/// The owner of an S3 object or bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Owner {
    /// The canonical user ID of the owner.
    pub id: String,
    /// The display name of the owner, when the service reports one.
    pub display_name: Option<String>,
}

impl Owner {
    /// Create an owner from a canonical ID and display name.
    #[must_use]
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: Some(display_name.into()),
        }
    }

    /// The display name, or the canonical ID when no name is known.
    #[must_use]
    pub fn name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.id)
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name(), self.id)
    }
}

// ---------------------------------------------------------------------------
// CannedAcl
// ---------------------------------------------------------------------------

/// Canned ACLs the facade applies.
///
/// Uploads are always `public-read`; server-side copies get the service
/// default, `private`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CannedAcl {
    /// Owner gets `FULL_CONTROL`. No one else has access rights (default).
    #[default]
    Private,
    /// Owner gets `FULL_CONTROL`. The `AllUsers` group gets `READ` access.
    PublicRead,
}

impl CannedAcl {
    /// Return the wire representation of the canned ACL.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Private => "private",
            Self::PublicRead => "public-read",
        }
    }

    /// Expand the canned ACL into the explicit policy it stands for.
    #[must_use]
    pub fn to_policy(self, owner: &Owner) -> AccessPolicy {
        let mut grants = vec![Grant::new(
            Grantee::canonical_user(owner),
            Permission::FullControl,
        )];
        if self == Self::PublicRead {
            grants.push(Grant::new(Grantee::all_users(), Permission::Read));
        }

        AccessPolicy {
            owner: owner.clone(),
            grants,
        }
    }
}

impl fmt::Display for CannedAcl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Grant / Grantee / Permission
// ---------------------------------------------------------------------------

/// An ACL grant that pairs a grantee with a permission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Grant {
    /// The entity receiving the permission.
    pub grantee: Grantee,
    /// The permission granted.
    pub permission: Permission,
}

impl Grant {
    /// Pair a grantee with a permission.
    #[must_use]
    pub fn new(grantee: Grantee, permission: Permission) -> Self {
        Self {
            grantee,
            permission,
        }
    }

    /// A `READ` grant for the account registered under `email`.
    #[must_use]
    pub fn read_by_email(email: impl Into<String>) -> Self {
        Self::new(
            Grantee::Email {
                address: email.into(),
            },
            Permission::Read,
        )
    }
}

/// A grantee in an ACL grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum Grantee {
    /// A canonical user identified by an AWS account ID.
    #[serde(rename_all = "camelCase")]
    CanonicalUser {
        /// The canonical user ID.
        id: String,
        /// The display name for the user.
        display_name: Option<String>,
    },
    /// A predefined Amazon S3 group.
    Group {
        /// The URI of the group (e.g. [`ALL_USERS_GROUP_URI`]).
        uri: String,
    },
    /// An AWS account identified by the email address it was registered with.
    Email {
        /// The email address of the grantee.
        address: String,
    },
}

impl Grantee {
    /// The canonical-user grantee matching `owner`.
    #[must_use]
    pub fn canonical_user(owner: &Owner) -> Self {
        Self::CanonicalUser {
            id: owner.id.clone(),
            display_name: owner.display_name.clone(),
        }
    }

    /// The `AllUsers` group grantee.
    #[must_use]
    pub fn all_users() -> Self {
        Self::Group {
            uri: ALL_USERS_GROUP_URI.to_owned(),
        }
    }
}

impl fmt::Display for Grantee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CanonicalUser { id, .. } => write!(f, "id={id}"),
            Self::Group { uri } => write!(f, "uri={uri}"),
            Self::Email { address } => write!(f, "email={address}"),
        }
    }
}

/// A permission that can be granted to a grantee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Permission {
    /// Grants full control (READ, WRITE, READ_ACP, WRITE_ACP).
    FullControl,
    /// Allows grantee to read the object data.
    Read,
    /// Allows grantee to create objects in the bucket.
    Write,
    /// Allows grantee to read the object ACL.
    ReadAcp,
    /// Allows grantee to write the object ACL.
    WriteAcp,
}

impl Permission {
    /// Return the wire representation of the permission.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::FullControl => "FULL_CONTROL",
            Self::Read => "READ",
            Self::Write => "WRITE",
            Self::ReadAcp => "READ_ACP",
            Self::WriteAcp => "WRITE_ACP",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing a [`Permission`] from a string fails.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown permission: {0}")]
pub struct ParsePermissionError(String);

impl FromStr for Permission {
    type Err = ParsePermissionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FULL_CONTROL" => Ok(Self::FullControl),
            "READ" => Ok(Self::Read),
            "WRITE" => Ok(Self::Write),
            "READ_ACP" => Ok(Self::ReadAcp),
            "WRITE_ACP" => Ok(Self::WriteAcp),
            _ => Err(ParsePermissionError(s.to_owned())),
        }
    }
}

// ---------------------------------------------------------------------------
// AccessPolicy
// ---------------------------------------------------------------------------

/// The full access-control policy of an object: its owner and every grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessPolicy {
    /// The owner of the object.
    pub owner: Owner,
    /// Grants in the order the service reported them.
    pub grants: Vec<Grant>,
}

impl AccessPolicy {
    /// Return a copy of this policy with `grant` appended after the existing grants.
    #[must_use]
    pub fn with_grant(&self, grant: Grant) -> Self {
        let mut grants = self.grants.clone();
        grants.push(grant);
        Self {
            owner: self.owner.clone(),
            grants,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
