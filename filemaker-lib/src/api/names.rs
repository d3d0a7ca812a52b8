//! Databases, layouts, scripts and fields

use crate::FileMakerClient;
use crate::api::query::Action;
use crate::error::Error;
use crate::error::FieldError;
use crate::meta::MetadataRegistry;

impl FileMakerClient {
    /// Lists the databases published through XML.
    pub async fn database_names(&self) -> Result<Vec<String>, Error> {
        self.names(Action::ListDatabases, "DATABASE_NAME").await
    }

    /// Lists the layouts of the database.
    pub async fn layout_names(&self) -> Result<Vec<String>, Error> {
        self.names(Action::ListLayouts, "LAYOUT_NAME").await
    }

    /// Lists the scripts of the database.
    pub async fn script_names(&self) -> Result<Vec<String>, Error> {
        self.names(Action::ListScripts, "SCRIPT_NAME").await
    }

    /// Returns the layout metadata without any record.
    pub async fn view(&self) -> Result<MetadataRegistry, Error> {
        let response = self.fetch(&self.query(Action::View)).await?;
        response.metadata_only().finish()
    }

    /// Lists the qualified names of the fields on the layout.
    pub async fn field_names(&self) -> Result<Vec<String>, Error> {
        Ok(self.view().await?.field_names())
    }

    async fn names(&self, action: Action, field: &str) -> Result<Vec<String>, Error> {
        let response = self.fetch(&self.query(action)).await?;
        let mut names = Vec::new();
        for record in response {
            let record = record?;
            let name = record
                .get_text(field)?
                .ok_or_else(|| FieldError::type_mismatch(field, "text", "null"))?;
            names.push(name.to_string());
        }
        Ok(names)
    }
}
