use crate::domain::model::{Calendar, Timetable};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn api_base_url(&self) -> &str;
    fn request_timeout(&self) -> Duration;
    fn client_id(&self) -> &str;
    fn product_id(&self) -> &str;
    fn tzid(&self) -> &str;
    fn output_path(&self) -> &str;
    fn output_filename(&self) -> &str;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Timetable>;
    async fn transform(&self, timetable: Timetable) -> Result<Calendar>;
    async fn load(&self, calendar: Calendar) -> Result<String>;
}
