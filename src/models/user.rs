#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub name: String,
    /// IANA zone name, e.g. "America/New_York". All of this user's schedule
    /// rows are wall-clock times in this zone.
    pub timezone: String,
}
