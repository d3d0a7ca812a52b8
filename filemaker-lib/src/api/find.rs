//! Find operations

use crate::FileMakerClient;
use crate::Response;
use crate::api::query::Action;
use crate::api::query::CompoundQuery;
use crate::api::query::Query;
use crate::error::Error;
use crate::model::Record;
use crate::model::Value;

impl FileMakerClient {
    /// Finds records matching every predicate.
    ///
    /// Predicate names accept `__` path separators and operator suffixes,
    /// e.g. `("size__gt", 4)` or `("orders__total__lte", 100)`. Use
    /// [`query`](FileMakerClient::query) with [`Action::Find`] for sorting,
    /// limits or `or` combination.
    pub async fn find<I, K, V>(&self, predicates: I) -> Result<Response, Error>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let query = with_predicates(self.query(Action::Find).lop("and")?, predicates)?;
        self.fetch(&query).await
    }

    /// Returns every record of the layout.
    pub async fn find_all(&self) -> Result<Response, Error> {
        self.fetch(&self.query(Action::FindAll)).await
    }

    /// Returns one record of the layout, if any.
    pub async fn find_any(&self) -> Result<Option<Record>, Error> {
        let mut response = self.fetch(&self.query(Action::FindAny)).await?;
        response.next().transpose()
    }

    /// Runs a compound find.
    pub async fn find_query(&self, compound: &CompoundQuery) -> Result<Response, Error> {
        let query = self.query(Action::CompoundFind).compound(compound)?;
        self.fetch(&query).await
    }

    /// Runs a script through a find-all request.
    ///
    /// The response lists the records of the layout; with `return_all` set
    /// to `false` it is limited to one record.
    pub async fn run_script(
        &self,
        script: &str,
        param: Option<&str>,
        return_all: bool,
    ) -> Result<Response, Error> {
        let mut query = self.query(Action::FindAll).script(script, param);
        if !return_all {
            query.set_max(1)?;
        }
        self.fetch(&query).await
    }
}

/// Adds operator-parsed predicates to a query.
fn with_predicates<I, K, V>(mut query: Query, predicates: I) -> Result<Query, Error>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<Value>,
{
    for (name, value) in predicates {
        query.add_param(name.as_ref(), value)?;
    }
    Ok(query)
}
