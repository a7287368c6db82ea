use crate::error::{Error, Result};
use crate::search::{RecipeQuery, SortOrder, Terms};

/// Query-string key carrying search terms
pub const TERMS_KEY: &str = "parameter";
/// Query-string key carrying the sort key
pub const SORT_KEY: &str = "filter";

/// Shape of a bracketed `parameter[...]` key
enum KeyShape {
    Scalar,
    List,
    Object,
}

fn terms_key_shape(key: &str) -> Option<KeyShape> {
    let rest = key.strip_prefix(TERMS_KEY)?;
    if rest.is_empty() {
        return Some(KeyShape::Scalar);
    }

    let inner = rest.strip_prefix('[')?.strip_suffix(']')?;
    if inner.chars().all(|c| c.is_ascii_digit()) {
        Some(KeyShape::List)
    } else {
        Some(KeyShape::Object)
    }
}

impl RecipeQuery {
    /// Build a query from a raw URL query string.
    ///
    /// `parameter=x` once is a single term; a repeated `parameter`, or any
    /// `parameter[]` / `parameter[0]` key, is a list of terms. Keyed
    /// entries like `parameter[a]=x` are rejected. A `filter` that appears
    /// more than once is not a sort key and yields the default order.
    pub fn from_query_string(raw: Option<&str>) -> Result<Self> {
        let mut values = Vec::new();
        let mut is_list = false;
        let mut sort_keys = Vec::new();

        for (key, value) in url::form_urlencoded::parse(raw.unwrap_or_default().as_bytes()) {
            if key == SORT_KEY {
                sort_keys.push(value.into_owned());
                continue;
            }

            match terms_key_shape(&key) {
                Some(KeyShape::Scalar) => values.push(value.into_owned()),
                Some(KeyShape::List) => {
                    is_list = true;
                    values.push(value.into_owned());
                }
                Some(KeyShape::Object) => {
                    return Err(Error::Validation(format!(
                        "`{key}`: search terms must be a string or a list of strings"
                    )));
                }
                None => {}
            }
        }

        let terms = if !is_list && values.len() == 1 {
            match values.pop() {
                Some(term) if !term.is_empty() => Terms::One(term),
                _ => Terms::Any,
            }
        } else {
            Terms::from(values)
        };

        let sort = match sort_keys.as_slice() {
            [key] => SortOrder::from_key(Some(key)),
            _ => SortOrder::Name,
        };

        Ok(RecipeQuery::new(terms, sort))
    }

    /// Encode this query back into `parameter`/`filter` pairs
    pub fn to_query_string(&self) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());

        match &self.terms {
            Terms::Any => {}
            Terms::One(term) => {
                serializer.append_pair(TERMS_KEY, term);
            }
            Terms::All(terms) => {
                for term in terms {
                    serializer.append_pair("parameter[]", term);
                }
            }
        }

        if let Some(key) = self.sort.key() {
            serializer.append_pair(SORT_KEY, key);
        }

        serializer.finish()
    }
}
