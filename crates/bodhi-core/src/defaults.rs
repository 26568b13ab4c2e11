//! Centralized default constants for the Bodhi interactor.
//!
//! Table names, column names, pagination defaults, and the fixed on-chain
//! parameters of the access gate. Crates reference these instead of
//! repeating string literals.

// =============================================================================
// TABLES
// =============================================================================

/// Space rows (`name` may be null for spaces that were never named).
pub const TABLE_SPACES: &str = "bodhi_spaces";

/// Collection rows, read verbatim.
pub const TABLE_COLLECTIONS: &str = "bodhi_collections";

/// Key/value constants.
pub const TABLE_CONSTANTS: &str = "bodhi_constants";

/// Text assets with content and embedding.
pub const TABLE_TEXT_ASSETS: &str = "bodhi_text_assets";

/// Text assets in key/value layout, carrying the image classification flag.
pub const TABLE_TEXT_ASSETS_KV: &str = "bodhi_text_assets_k_v";

/// Image assets derived from text assets.
pub const TABLE_IMG_ASSETS: &str = "bodhi_img_assets_k_v";

/// Indexer progress rows.
pub const TABLE_INDEXER: &str = "bodhi_indexer";

/// Suffix appended to a space contract address to name its indexer table.
pub const SPACE_INDEXER_SUFFIX: &str = "_indexer";

/// Every fixed-name table (per-space indexer tables excluded).
pub const BODHI_TABLES: [&str; 7] = [
    TABLE_SPACES,
    TABLE_COLLECTIONS,
    TABLE_CONSTANTS,
    TABLE_TEXT_ASSETS,
    TABLE_TEXT_ASSETS_KV,
    TABLE_IMG_ASSETS,
    TABLE_INDEXER,
];

/// Tables `/text_search` is allowed to query.
pub const SEARCHABLE_TABLES: [&str; 2] = [TABLE_TEXT_ASSETS, TABLE_TEXT_ASSETS_KV];

/// Indexer name reported by `/assets_index_latest`.
pub const INDEXER_NAME: &str = "bodhi";

// =============================================================================
// COLUMNS
// =============================================================================

pub const COL_ID: &str = "id";
pub const COL_ID_ON_CHAIN: &str = "id_on_chain";
pub const COL_CREATOR: &str = "creator";
pub const COL_CONTENT: &str = "content";
pub const COL_EMBEDDING: &str = "embedding";
pub const COL_ABSTRACT: &str = "abstract";
pub const COL_CATEGORY: &str = "category";
pub const COL_TYPE: &str = "type";
pub const COL_NAME: &str = "name";
pub const COL_KEY: &str = "key";
pub const COL_INDEX: &str = "index";
pub const COL_CREATED_AT: &str = "created_at";
pub const COL_METADATA: &str = "metadata";
pub const COL_LINK: &str = "link";

/// Markdown body of a key/value text asset.
pub const COL_DATA: &str = "data";

/// Image classification flag on key/value text assets.
pub const COL_IMG_FLAG: &str = "if_to_img_assets";

// =============================================================================
// PAGINATION
// =============================================================================

/// Default page size for image listings.
pub const IMG_PAGE_LIMIT: i64 = 10;

/// Default page number for offset pagination (1-based).
pub const IMG_PAGE: i64 = 1;

// =============================================================================
// SERVER
// =============================================================================

/// Default bind host.
pub const HOST: &str = "0.0.0.0";

/// Default bind port.
pub const PORT: u16 = 8000;

// =============================================================================
// CHAIN GATE
// =============================================================================

/// Optimism mainnet JSON-RPC endpoint.
pub const CHAIN_RPC_URL: &str = "https://mainnet.optimism.io";

/// Bodhi share contract (ERC-1155 style `balanceOf(address,uint256)`).
pub const BODHI_CONTRACT: &str = "0x2ad82a4e39bac43a54ddfe6f94980aaf0d1409ef";

/// Asset whose shares gate access.
pub const GATE_ASSET_ID: u64 = 14020;

/// Minimum hold in base units: 0.001 shares at 18 decimals.
pub const GATE_MIN_HOLD_BASE_UNITS: u64 = 1_000_000_000_000_000;
