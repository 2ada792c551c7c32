/// Connection settings applied every time a database is opened.
pub const PRAGMAS_SQL: &str = "
PRAGMA foreign_keys = ON;
PRAGMA synchronous = NORMAL;
";

pub const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS pages (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL UNIQUE,
    content     TEXT NOT NULL DEFAULT '',
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS page_links (
    from_page_id  INTEGER NOT NULL REFERENCES pages(id) ON DELETE CASCADE,
    to_page_id    INTEGER NOT NULL REFERENCES pages(id) ON DELETE CASCADE,
    link_text     TEXT NOT NULL,
    created_at    TEXT NOT NULL,
    PRIMARY KEY (from_page_id, to_page_id)
);

CREATE INDEX IF NOT EXISTS idx_page_links_to ON page_links(to_page_id);
";

pub const PAGE_COLUMNS: &str = "id, name, content, created_at, updated_at";
