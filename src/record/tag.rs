//! Field tag parsing.
//!
//! Every record field carries two raw tag strings: the directive tag written as
//! `#[tideline(...)]` and the naming tag written as `#[db = "..."]`. Both are plain
//! comma-separated token lists, kept verbatim in the record descriptor and parsed
//! here into a [`FieldDirective`].
//!
//! Parsing is permissive: unknown tokens are ignored and nothing is ever rejected.

/// Directive token: field is left out of SELECT column lists.
pub const SKIP_SELECT: &str = "skip_select";
/// Directive token: field is left out of INSERT rows.
pub const SKIP_INSERT: &str = "skip_insert";
/// Directive token: field is left out of UPDATE payloads.
pub const SKIP_UPDATE: &str = "skip_update";
/// Directive token: field is left out of DELETE value sets.
pub const SKIP_DELETE: &str = "skip_delete";
/// Directive token: the zero-skip policy never drops this field.
pub const SKIP_COMPARE: &str = "skip_compare";
/// Directive token: encode the current local time instead of the field value.
pub const DEFAULT_NOW: &str = "now";
/// Directive token: encode the current UTC time instead of the field value.
pub const DEFAULT_NOW_UTC: &str = "now_utc";
/// Naming-tag token: drop the field from value maps when it holds its zero value.
pub const OMIT_EMPTY: &str = "omitempty";
/// Naming-tag token: drop the field from value maps when it is `None`.
pub const OMIT_NIL: &str = "omitnil";

/// The statement kind a column or value set is being produced for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipKind {
    /// SELECT column lists
    Select,
    /// INSERT rows
    Insert,
    /// UPDATE payloads
    Update,
    /// DELETE value sets
    Delete,
}

impl SkipKind {
    /// The directive token that excludes a field from this kind of statement.
    pub fn token(self) -> &'static str {
        match self {
            SkipKind::Select => SKIP_SELECT,
            SkipKind::Insert => SKIP_INSERT,
            SkipKind::Update => SKIP_UPDATE,
            SkipKind::Delete => SKIP_DELETE,
        }
    }

    fn bit(self) -> u8 {
        match self {
            SkipKind::Select => 1,
            SkipKind::Insert => 1 << 1,
            SkipKind::Update => 1 << 2,
            SkipKind::Delete => 1 << 3,
        }
    }

    fn from_token(token: &str) -> Option<Self> {
        match token {
            SKIP_SELECT => Some(SkipKind::Select),
            SKIP_INSERT => Some(SkipKind::Insert),
            SKIP_UPDATE => Some(SkipKind::Update),
            SKIP_DELETE => Some(SkipKind::Delete),
            _ => None,
        }
    }
}

/// Parsed per-field directives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldDirective {
    skips: u8,
    /// Explicit column name from the naming tag, after cleaning.
    pub rename: Option<String>,
    pub omit_empty: bool,
    pub omit_nil: bool,
    pub skip_compare: bool,
    pub default_now: bool,
    pub default_now_utc: bool,
}

impl FieldDirective {
    /// Whether the field is excluded from statements of `kind`.
    pub fn skips(&self, kind: SkipKind) -> bool {
        self.skips & kind.bit() != 0
    }

    /// All skip kinds carried by the field, in declaration order of [`SkipKind`].
    pub fn skip_kinds(&self) -> Vec<SkipKind> {
        [SkipKind::Select, SkipKind::Insert, SkipKind::Update, SkipKind::Delete]
            .into_iter()
            .filter(|kind| self.skips(*kind))
            .collect()
    }
}

fn tokens(tag: &str) -> impl Iterator<Item = &str> {
    tag.split(',').map(str::trim).filter(|t| !t.is_empty())
}

/// Parse the directive tag and the naming tag of one field.
///
/// # Example
///
/// ```
/// use tideline::record::tag::{parse_directives, SkipKind};
///
/// let directive = parse_directives("skip_insert,now_utc", "created_at,omitempty");
/// assert!(directive.skips(SkipKind::Insert));
/// assert!(!directive.skips(SkipKind::Update));
/// assert!(directive.default_now_utc);
/// assert!(directive.omit_empty);
/// assert_eq!(directive.rename.as_deref(), Some("created_at"));
/// ```
pub fn parse_directives(directive_tag: &str, db_tag: &str) -> FieldDirective {
    let mut directive = FieldDirective::default();

    for token in tokens(directive_tag) {
        if let Some(kind) = SkipKind::from_token(token) {
            directive.skips |= kind.bit();
            continue;
        }
        match token {
            SKIP_COMPARE => directive.skip_compare = true,
            DEFAULT_NOW => directive.default_now = true,
            DEFAULT_NOW_UTC => directive.default_now_utc = true,
            _ => {}
        }
    }

    for token in tokens(db_tag) {
        match token {
            OMIT_EMPTY => directive.omit_empty = true,
            OMIT_NIL => directive.omit_nil = true,
            _ => {}
        }
    }

    directive.rename = rename_from(db_tag);
    directive
}

fn rename_from(db_tag: &str) -> Option<String> {
    let cleaned = clean_db_tag(db_tag, &[OMIT_EMPTY, OMIT_NIL]);
    tokens(&cleaned).next().map(str::to_string)
}

/// Strip directive tokens from a naming tag.
///
/// For each token `d`, in order: a tag equal to `d` becomes empty; a `d,` prefix and a
/// `,d` suffix are stripped; an infix `,d,` collapses to `,`. Leftover leading and
/// trailing commas are trimmed once every token has been processed.
///
/// ```
/// use tideline::record::tag::clean_db_tag;
///
/// assert_eq!(clean_db_tag("col,omitempty", &["omitempty"]), "col");
/// assert_eq!(clean_db_tag("omitempty,col", &["omitempty"]), "col");
/// assert_eq!(clean_db_tag("a,omitempty,b", &["omitempty"]), "a,b");
/// assert_eq!(clean_db_tag("omitempty", &["omitempty"]), "");
/// ```
pub fn clean_db_tag(tag: &str, directives: &[&str]) -> String {
    let mut tag = tag.to_string();

    for directive in directives {
        if tag == *directive {
            return String::new();
        }

        let prefix = format!("{directive},");
        if let Some(rest) = tag.strip_prefix(&prefix) {
            tag = rest.to_string();
        }

        let suffix = format!(",{directive}");
        if let Some(rest) = tag.strip_suffix(&suffix) {
            tag = rest.to_string();
        }

        let infix = format!(",{directive},");
        if tag.contains(&infix) {
            tag = tag.replace(&infix, ",");
        }
    }

    tag.trim_matches(',').to_string()
}

/// Resolve the column name of a field.
///
/// The first token of the cleaned naming tag wins; when the tag carries no name the
/// snake-cased field identifier is used. Every component that needs a column name
/// goes through this function.
///
/// ```
/// use tideline::record::tag::resolve_column_name;
///
/// assert_eq!(resolve_column_name("db_tag", "another_col_name"), "another_col_name");
/// assert_eq!(resolve_column_name("IntField", ""), "int_field");
/// assert_eq!(resolve_column_name("count", "omitempty"), "count");
/// ```
pub fn resolve_column_name(ident: &str, db_tag: &str) -> String {
    rename_from(db_tag).unwrap_or_else(|| snake_case(ident))
}

/// Convert an identifier to snake_case.
///
/// Acronyms stay together (`HTTPCode` becomes `http_code`), digits stick to the word
/// before them, and a raw-identifier `r#` prefix is dropped.
pub fn snake_case(ident: &str) -> String {
    let ident = ident.strip_prefix("r#").unwrap_or(ident);
    let chars: Vec<char> = ident.chars().collect();
    let mut result = String::with_capacity(ident.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c == '-' || c == ' ' || c == '_' {
            if !result.is_empty() && !result.ends_with('_') {
                result.push('_');
            }
            continue;
        }

        if c.is_uppercase() {
            let prev = i.checked_sub(1).map(|p| chars[p]);
            let next = chars.get(i + 1).copied();
            let boundary = match prev {
                Some(p) if p.is_lowercase() || p.is_ascii_digit() => true,
                Some(p) if p.is_uppercase() => next.is_some_and(|n| n.is_lowercase()),
                _ => false,
            };
            if boundary && !result.is_empty() && !result.ends_with('_') {
                result.push('_');
            }
            result.extend(c.to_lowercase());
        } else {
            result.push(c);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_tags_yield_default_directive() {
        assert_eq!(parse_directives("", ""), FieldDirective::default());
    }

    #[test]
    fn test_skip_tokens_accumulate() {
        let directive = parse_directives("skip_insert, skip_update", "");
        assert!(directive.skips(SkipKind::Insert));
        assert!(directive.skips(SkipKind::Update));
        assert!(!directive.skips(SkipKind::Select));
        assert!(!directive.skips(SkipKind::Delete));
        assert_eq!(directive.skip_kinds(), vec![SkipKind::Insert, SkipKind::Update]);
    }

    #[test]
    fn test_tokens_match_exactly() {
        // `now` must not be picked up from `now_utc`
        let directive = parse_directives("now_utc", "");
        assert!(directive.default_now_utc);
        assert!(!directive.default_now);

        let directive = parse_directives("skip_selection,nowhere", "");
        assert!(!directive.skips(SkipKind::Select));
        assert!(!directive.default_now);
    }

    #[test]
    fn test_unknown_tokens_are_ignored() {
        let directive = parse_directives("primary,,skip_delete,whatever", "name,unique");
        assert!(directive.skips(SkipKind::Delete));
        assert_eq!(directive.rename.as_deref(), Some("name"));
    }

    #[test]
    fn test_naming_tag_flags() {
        let directive = parse_directives("", "ptr_field,omitnil,omitempty");
        assert!(directive.omit_nil);
        assert!(directive.omit_empty);
        assert_eq!(directive.rename.as_deref(), Some("ptr_field"));

        let directive = parse_directives("", "omitempty");
        assert!(directive.omit_empty);
        assert_eq!(directive.rename, None);
    }

    #[test]
    fn test_clean_db_tag_placements() {
        assert_eq!(clean_db_tag("col,omitempty", &[OMIT_EMPTY]), "col");
        assert_eq!(clean_db_tag("omitempty,col", &[OMIT_EMPTY]), "col");
        assert_eq!(clean_db_tag("a,omitempty,b", &[OMIT_EMPTY]), "a,b");
        assert_eq!(clean_db_tag("omitempty", &[OMIT_EMPTY]), "");
        assert_eq!(clean_db_tag("omitnil,field_name", &[OMIT_EMPTY, OMIT_NIL]), "field_name");
        assert_eq!(clean_db_tag("col", &[OMIT_EMPTY, OMIT_NIL]), "col");
    }

    #[test]
    fn test_clean_db_tag_both_tokens() {
        assert_eq!(clean_db_tag("ptr_field,omitnil,omitempty", &[OMIT_EMPTY, OMIT_NIL]), "ptr_field");
        assert_eq!(clean_db_tag("omitempty,ptr_field,omitnil", &[OMIT_EMPTY, OMIT_NIL]), "ptr_field");
        assert_eq!(clean_db_tag("a,omitempty,omitnil,b", &[OMIT_EMPTY, OMIT_NIL]), "a,b");
    }

    #[test]
    fn test_clean_db_tag_is_idempotent() {
        for tag in ["col,omitempty", "omitempty,col", "a,omitempty,b", "omitempty", "x,omitnil"] {
            let once = clean_db_tag(tag, &[OMIT_EMPTY, OMIT_NIL]);
            let twice = clean_db_tag(&once, &[OMIT_EMPTY, OMIT_NIL]);
            assert_eq!(once, twice, "cleaning {tag:?} twice changed the result");
        }
    }

    #[test]
    fn test_clean_db_tag_trims_stray_commas() {
        assert_eq!(clean_db_tag(",col,", &[]), "col");
        assert_eq!(clean_db_tag("table_2", &[]), "table_2");
    }

    #[test]
    fn test_resolve_column_name_prefers_rename() {
        assert_eq!(resolve_column_name("string_field", "cool_field"), "cool_field");
        assert_eq!(resolve_column_name("int_field", "int_field,omitempty"), "int_field");
        assert_eq!(resolve_column_name("field", "omitnil,field_name"), "field_name");
        assert_eq!(resolve_column_name("table1_alias", "table_alias"), "table_alias");
    }

    #[test]
    fn test_resolve_column_name_falls_back_to_snake_case() {
        assert_eq!(resolve_column_name("DbOsField", ""), "db_os_field");
        assert_eq!(resolve_column_name("field", "omitempty"), "field");
        assert_eq!(resolve_column_name("r#type", ""), "type");
    }

    #[test]
    fn test_snake_case() {
        assert_eq!(snake_case("IntField"), "int_field");
        assert_eq!(snake_case("int_field"), "int_field");
        assert_eq!(snake_case("User"), "user");
        assert_eq!(snake_case("HTTPCode"), "http_code");
        assert_eq!(snake_case("UserID"), "user_id");
        assert_eq!(snake_case("Table1"), "table1");
        assert_eq!(snake_case("Table1Alias"), "table1_alias");
        assert_eq!(snake_case("already__snake"), "already_snake");
    }
}
