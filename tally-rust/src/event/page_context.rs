use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referrer: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

/// Supplies the host's current page/screen context when an event is built.
pub trait PageContextProvider: Send + Sync {
    fn current_page(&self) -> PageContext;
}

impl<F> PageContextProvider for F
where
    F: Fn() -> PageContext + Send + Sync,
{
    fn current_page(&self) -> PageContext {
        self()
    }
}

impl PageContextProvider for PageContext {
    fn current_page(&self) -> PageContext {
        self.clone()
    }
}
