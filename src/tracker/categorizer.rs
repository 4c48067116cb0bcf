//! Picks a category label for a finished activity by asking the oracle,
//! biased toward the vocabulary that is already in use.

use tracing::debug;

use crate::{
    error::{Result, TrackError},
    oracle::Oracle,
};

use super::store::ActivityStore;

/// Returns the label the oracle picked. The label is trimmed but otherwise
/// taken as-is; recording its usage happens together with the activity
/// completion so both land in one transaction.
pub async fn categorize(
    store: &ActivityStore,
    oracle: &dyn Oracle,
    activity_name: &str,
) -> Result<String> {
    let existing = store.category_names_by_usage()?;
    let prompt = build_prompt(activity_name, &existing);
    let category = oracle.query(&prompt).await?.trim().to_string();
    debug!("Oracle categorized '{activity_name}' as '{category}'");
    if category.is_empty() {
        return Err(TrackError::Oracle {
            attempts: 1,
            message: "oracle returned an empty category label".into(),
        });
    }
    Ok(category)
}

fn build_prompt(activity_name: &str, existing: &[String]) -> String {
    let vocabulary = if existing.is_empty() {
        "None yet".to_string()
    } else {
        existing.join(", ")
    };
    format!(
        "Given these existing categories: {vocabulary},\n\
         what category best fits this activity: '{activity_name}'?\n\
         If none fit well, suggest a new category name.\n\
         Respond with just the category name, nothing else."
    )
}
