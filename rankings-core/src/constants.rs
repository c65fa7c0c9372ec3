//! Constants that are part of the on-disk/wire contract. The salt in
//! particular must never change: it is baked into every previously
//! emitted `id` field, so a re-implementation that changes it silently
//! breaks compatibility with prior output.

/// Salt appended to a raw matricola before hashing. Part of the on-disk
/// contract — see the hashing invariants.
pub const SALT_GLOBAL: &str = "saltPoliNetwork";

/// Hex characters kept from the SHA-256 digest of `rawId || SALT_GLOBAL`.
pub const HASH_LEN: usize = 20;

pub const WEB_RISULTATI_AMMISSIONE_HOST: &str = "www.risultati-ammissione.polimi.it";
pub const WEB_AVVISI_FUTURI_STUDENTI_URL: &str = "https://www.polimi.it/futuri-studenti/avvisi";

/// URL suffix that identifies the by-course sub-index. Must be tested
/// before [`HTML_INDEX_SUFFIX_BY_ID`] and [`HTML_INDEX_SUFFIX_BY_MERIT`]
/// since by-merit's suffix is a prefix of by-course's.
pub const HTML_INDEX_SUFFIX_BY_COURSE: &str = "_sotto_indice.html";
pub const HTML_INDEX_SUFFIX_BY_ID: &str = "_indice_M.html";
pub const HTML_INDEX_SUFFIX_BY_MERIT: &str = "_generale.html";

pub const OUTPUT_HTML_FOLDER: &str = "html";
pub const OUTPUT_HTML_INDEX_FILENAME: &str = "index.html";
pub const OUTPUT_HTML_BY_MERIT_FOLDER: &str = "by_merit";
pub const OUTPUT_HTML_BY_ID_FOLDER: &str = "by_id";
pub const OUTPUT_HTML_BY_COURSE_FOLDER: &str = "by_course";

pub const OUTPUT_LINKS_FOLDER: &str = "links";
pub const OUTPUT_SCRAPED_LINKS_FILENAME: &str = "scraped_links.json";
pub const OUTPUT_BROKEN_LINKS_FILENAME: &str = "broken_links.json";
pub const OUTPUT_BRUTEFORCE_FOLDER: &str = "bruteforce";

pub const OUTPUT_BASE_FOLDER: &str = "output";
pub const OUTPUT_MANIFESTI_FOLDER: &str = "manifesti";
pub const OUTPUT_MANIFESTI_LIST_FILENAME: &str = "manifesti_list.json";
pub const OUTPUT_MANIFESTI_ALL_FILENAME: &str = "all.json";
pub const OUTPUT_RANKINGS_FOLDER: &str = "rankings";
pub const OUTPUT_INDEXES_FOLDER: &str = "indexes";
pub const OUTPUT_INDEX_BY_SCHOOL_YEAR_FILENAME: &str = "by_school_year.json";
pub const OUTPUT_INDEX_BY_YEAR_SCHOOL_FILENAME: &str = "by_year_school.json";
pub const OUTPUT_ID_HASH_INDEX_FILENAME: &str = "studentIdHashIndex.json";

/// A ranking directory literally named this is writer scratch space, not a
/// ranking, and the parse pipeline must skip it.
pub const STYLE_DIRECTORY_NAME: &str = "style";

pub const USER_AGENT: &str = "Mozilla/5.0 (rankings-ingest)";
