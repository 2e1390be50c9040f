//! Genre and the manhwa/genre junction.

use serde::{Deserialize, Serialize};

/// §3: `{ id, name, slug }`, `slug` unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

/// §3: junction row; primary key is the `(manhwa_id, genre_id)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManhwaGenre {
    pub manhwa_id: i64,
    pub genre_id: i64,
}
