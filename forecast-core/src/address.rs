use crate::model::{Patient, PostalCode};

/// Postal code of the patient's first address entry.
///
/// Later entries are never consulted, and the code is not validated. An empty
/// postal code counts as missing.
pub fn extract_postal_code(patient: Option<&Patient>) -> Option<PostalCode> {
    let code = patient?.address.first()?.postal_code.as_deref()?;

    if code.is_empty() {
        return None;
    }

    Some(PostalCode::new(code))
}
