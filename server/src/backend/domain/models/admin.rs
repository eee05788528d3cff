/// One row of the administrator credentials table.
///
/// This is the original flat-file scheme kept for interoperability; it is
/// deliberately not a security boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct AdminCredential {
    pub username: String,
    pub password: String,
}
