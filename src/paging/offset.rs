//! Offset extraction from PokeAPI page links

use crate::error::{Error, Result};
use url::Url;

/// Query parameter PokeAPI uses for the skip count
pub const OFFSET_PARAM: &str = "offset";

/// Offset of the page a `previous`/`next` link points at.
///
/// `None` means there is no such page. A link without an `offset` parameter
/// addresses the start of the list, so it yields `Some(0)`. Links that do not
/// parse, or whose offset is not a non-negative integer, are an error.
pub fn offset_from_url(link: Option<&str>) -> Result<Option<u32>> {
    let Some(link) = link else {
        return Ok(None);
    };
    let url = Url::parse(link)?;
    offset_from_query(url.query_pairs()).map(Some)
}

/// Offset found in decoded query pairs, defaulting to zero
pub fn offset_from_query<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Result<u32>
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let Some((_, value)) = pairs
        .into_iter()
        .find(|(key, _)| key.as_ref() == OFFSET_PARAM)
    else {
        return Ok(0);
    };
    let value = value.as_ref();
    value
        .trim()
        .parse()
        .map_err(|_| Error::decode(format!("Invalid offset '{value}' in page link")))
}
