//! Column listing filter for the listfields route.

use crate::error::AppError;
use crate::store::FieldInfo;
use regex::Regex;

/// Build the column-name matcher from a `a,b|c` filter. `None` when the filter names nothing.
pub fn field_pattern(fields: &str, exact: bool) -> Result<Option<Regex>, AppError> {
    let alternatives: Vec<String> = fields
        .split([',', '|'])
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(|f| if exact { format!("^{}$", f) } else { f.to_string() })
        .collect();
    if alternatives.is_empty() {
        return Ok(None);
    }
    Regex::new(&alternatives.join("|"))
        .map(Some)
        .map_err(|e| AppError::BadRequest(format!("invalid fields filter: {}", e)))
}

/// Keep only columns whose name matches the filter; no filter keeps everything.
pub fn filter_fields(
    data: Vec<FieldInfo>,
    fields: Option<&str>,
    exact: bool,
) -> Result<Vec<FieldInfo>, AppError> {
    let Some(pattern) = fields.map(|f| field_pattern(f, exact)).transpose()?.flatten() else {
        return Ok(data);
    };
    Ok(data
        .into_iter()
        .filter(|f| pattern.is_match(&f.column_name))
        .collect())
}

/// `exact` counts as requested when present, unless it spells false.
pub fn exact_requested(raw: Option<&str>) -> bool {
    match raw {
        None => false,
        Some(v) => !matches!(v.trim().to_ascii_lowercase().as_str(), "false" | "0"),
    }
}
