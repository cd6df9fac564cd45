/*! Release catalog

The archive.org scrape API answers with the list of every URLTeam release:

```json
{"items":[{"identifier":"urlteam_2020-11-20-03-17-04","item_size":123}],"count":1,"total":1}
```

Releases are listed in chronological order, the last one being the most recent.
!*/
use log::debug;
use serde::Deserialize;

use crate::config::LATEST;
use crate::download::Fetch;
use crate::error::Error;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct CatalogItem {
    pub identifier: String,
    #[serde(default)]
    pub item_size: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    items: Vec<CatalogItem>,
    #[serde(default)]
    count: usize,
    #[serde(default)]
    total: usize,
}

impl Catalog {
    pub fn from_slice(body: &[u8]) -> Result<Self, Error> {
        let catalog: Catalog = serde_json::from_slice(body)?;
        debug!(
            "catalog has {} items (count={}, total={})",
            catalog.items.len(),
            catalog.count,
            catalog.total
        );
        Ok(catalog)
    }

    /// Query the catalog at `url`.
    pub async fn fetch(fetcher: &dyn Fetch, url: &str) -> Result<Self, Error> {
        let body = fetcher.fetch(url).await?;
        Self::from_slice(&body)
    }

    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    /// Find the archive identifier of `date` (`YYYY-MM-DD` or `latest`).
    pub fn resolve(&self, date: &str) -> Result<&str, Error> {
        let item = if date == LATEST {
            self.items.last()
        } else {
            self.items.iter().find(|item| item.identifier.contains(date))
        };

        item.map(|item| item.identifier.as_str())
            .ok_or_else(|| Error::NotFound(date.to_string()))
    }
}
