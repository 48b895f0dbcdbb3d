use crate::api::{Result, WhisperApi, THEMES};
use crate::models::Theme;

impl WhisperApi {
    /// All themes, alphabetical
    pub async fn get_themes(&self) -> Result<Vec<Theme>> {
        let query = self.rest.from(THEMES).order("name", true);
        Ok(self.rest.execute(&query).await.rows()?)
    }

    pub async fn get_theme(&self, theme_id: &str) -> Result<Option<Theme>> {
        let query = self.rest.from(THEMES).eq("id", theme_id).maybe_single();
        Ok(self.rest.execute(&query).await.row()?)
    }
}
