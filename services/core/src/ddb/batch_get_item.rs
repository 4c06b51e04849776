use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::error::BatchGetItemError;
use aws_sdk_dynamodb::model::{AttributeValue, KeysAndAttributes};
use aws_sdk_dynamodb::output::BatchGetItemOutput;
use aws_sdk_dynamodb::types::SdkError;
use typed_builder::TypedBuilder;

use super::adapter::Adapter;

/// Fetches many items of a single table by key.
///
/// DynamoDB accepts at most 100 keys per request and may hand some of them back as unprocessed;
/// callers are responsible for both.
#[derive(Debug, Clone, TypedBuilder)]
pub struct BatchGetItemInput {
    #[builder(setter(into))]
    pub table_name: String,

    pub keys: Vec<HashMap<String, AttributeValue>>,

    #[builder(default = true)]
    pub consistent_read: bool,
}

#[async_trait]
pub trait BatchGetItem {
    async fn batch_get_item(&self, input: BatchGetItemInput) -> Result<BatchGetItemOutput, SdkError<BatchGetItemError>>;
}

#[async_trait]
impl BatchGetItem for Adapter {
    async fn batch_get_item(&self, input: BatchGetItemInput) -> Result<BatchGetItemOutput, SdkError<BatchGetItemError>> {
        let keys_and_attributes = KeysAndAttributes::builder()
            .set_keys(Some(input.keys))
            .consistent_read(input.consistent_read)
            .build();

        self.raw
            .batch_get_item()
            .request_items(input.table_name, keys_and_attributes)
            .send()
            .await
    }
}
