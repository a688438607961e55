//! Core types for nav-adapter

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// NAV object types, with discriminants matching the `Type` column of the
/// `dbo.Object` table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ObjectType {
    /// Table object
    Table = 1,
    /// Form object (classic client)
    Form = 2,
    /// Report object
    Report = 3,
    /// Dataport object (classic client)
    Dataport = 4,
    /// Codeunit object
    Codeunit = 5,
    /// XMLport object
    XmlPort = 6,
    /// MenuSuite object
    MenuSuite = 7,
    /// Page object
    Page = 8,
    /// Query object
    Query = 9,
}

impl ObjectType {
    /// All object types, in `dbo.Object` discriminant order
    pub const ALL: [ObjectType; 9] = [
        ObjectType::Table,
        ObjectType::Form,
        ObjectType::Report,
        ObjectType::Dataport,
        ObjectType::Codeunit,
        ObjectType::XmlPort,
        ObjectType::MenuSuite,
        ObjectType::Page,
        ObjectType::Query,
    ];

    /// Convert a `dbo.Object` type code to an `ObjectType`
    pub fn from_i32(code: i32) -> Option<Self> {
        match code {
            1 => Some(ObjectType::Table),
            2 => Some(ObjectType::Form),
            3 => Some(ObjectType::Report),
            4 => Some(ObjectType::Dataport),
            5 => Some(ObjectType::Codeunit),
            6 => Some(ObjectType::XmlPort),
            7 => Some(ObjectType::MenuSuite),
            8 => Some(ObjectType::Page),
            9 => Some(ObjectType::Query),
            _ => None,
        }
    }

    /// The `dbo.Object` type code for this object type
    pub fn to_i32(self) -> i32 {
        self as i32
    }
}

impl std::fmt::Display for ObjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ObjectType::Table => "Table",
            ObjectType::Form => "Form",
            ObjectType::Report => "Report",
            ObjectType::Dataport => "Dataport",
            ObjectType::Codeunit => "Codeunit",
            ObjectType::XmlPort => "XMLPort",
            ObjectType::MenuSuite => "MenuSuite",
            ObjectType::Page => "Page",
            ObjectType::Query => "Query",
        };
        write!(f, "{name}")
    }
}

/// A unique reference to a NAV object in a database
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectReference {
    /// The object type
    pub object_type: ObjectType,
    /// The object id
    pub id: i32,
}

impl ObjectReference {
    /// Create a new object reference
    pub fn new(object_type: ObjectType, id: i32) -> Self {
        Self { object_type, id }
    }
}

impl std::fmt::Display for ObjectReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.object_type, self.id)
    }
}

/// License status of a single exported object
///
/// Returned by single-object export: an unlicensed object is a normal,
/// non-exceptional outcome there (the caller decides what to do with it).
/// Multi-object export raises
/// [`ExportError::LicenseDenied`](crate::error::ExportError) instead.
#[must_use]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LicenseStatus {
    /// The object is covered by the active license and was exported
    Licensed,
    /// The object is excluded by the active license; nothing was exported
    Unlicensed,
}

impl LicenseStatus {
    /// Returns `true` if the object is covered by the active license
    pub fn is_licensed(self) -> bool {
        matches!(self, LicenseStatus::Licensed)
    }
}

/// Metadata of a NAV object, as stored in the `dbo.Object` table
///
/// Used for update detection against a mirrored database: `row_version`
/// changes on any modification of the object row, including locking and
/// unlocking.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectMetadata {
    /// The object identifier
    pub reference: ObjectReference,
    /// The object's name (`Name` column)
    pub name: String,
    /// The object's BLOB size in bytes (`[BLOB Size]` column)
    pub blob_size: i32,
    /// The object's version list (`[Version List]` column)
    pub version_list: String,
    /// Combination of the `Date` and `Time` columns
    pub modified: NaiveDateTime,
    /// The `timestamp` (rowversion) column, hex-encoded as `"AB-CD-..."`
    pub row_version: String,
}

/// Status of a NAV service tier, decoded from the `Status` column of
/// `dbo.[Server Instance]`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceTierStatus {
    /// The service tier is running (code 0)
    Started,
    /// The service tier is stopped (code 1)
    Stopped,
    /// The service tier crashed (code 2)
    Crashed,
    /// Unrecognized status code
    Unknown,
}

impl ServiceTierStatus {
    /// Decode a `dbo.[Server Instance]` status code
    pub fn from_i32(code: i32) -> Self {
        match code {
            0 => ServiceTierStatus::Started,
            1 => ServiceTierStatus::Stopped,
            2 => ServiceTierStatus::Crashed,
            _ => ServiceTierStatus::Unknown,
        }
    }
}

/// A NAV service tier registered for the application database
///
/// Corresponds to the development environment's "File - Database -
/// Information" view. finsql.exe needs exactly one usable service tier;
/// none or several is a distinct failure class
/// ([`ExportError::NoServiceTier`](crate::error::ExportError)).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceTier {
    /// Host name of the machine running the service tier
    pub server_name: String,
    /// Service instance name
    pub instance: String,
    /// Management port
    pub management_port: i32,
    /// When the instance last reported activity
    pub last_active: NaiveDateTime,
    /// Decoded instance status
    pub status: ServiceTierStatus,
}
