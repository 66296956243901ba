//! services/client/src/api/upload.rs

use bytes::Bytes;
use marketplace_core::domain::UploadedFile;
use marketplace_core::ports::{ApiRequest, PortError, PortResult};

use super::wire::UploadRecord;
use super::{path_segment, MarketplaceApi};

impl MarketplaceApi {
    /// POST /upload as a single-part multipart form under the `file` field.
    pub async fn upload(
        &self,
        file_name: &str,
        content_type: &str,
        bytes: impl Into<Bytes>,
    ) -> PortResult<UploadedFile> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(PortError::Validation("Cannot upload an empty file".to_string()));
        }
        let request = ApiRequest::post("/upload").file("file", file_name, content_type, bytes);
        self.client
            .send_json::<UploadRecord>(request)
            .await
            .map(UploadRecord::to_domain)
    }

    /// DELETE /upload/:filename
    pub async fn delete_upload(&self, filename: &str) -> PortResult<()> {
        let path = format!("/upload/{}", path_segment(filename));
        self.client.send_ok(ApiRequest::delete(path)).await?;
        Ok(())
    }
}
