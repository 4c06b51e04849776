use async_trait::async_trait;
use aws_sdk_dynamodb::error::TransactWriteItemsError;
use aws_sdk_dynamodb::model::TransactWriteItem;
use aws_sdk_dynamodb::output::TransactWriteItemsOutput;
use aws_sdk_dynamodb::types::SdkError;
use typed_builder::TypedBuilder;

use super::adapter::Adapter;

/// All-or-nothing write across tables. DynamoDB caps a transaction at 25 items.
#[derive(Debug, Clone, TypedBuilder)]
pub struct TransactWriteItemsInput {
    pub items: Vec<TransactWriteItem>,

    #[builder(default, setter(strip_option, into))]
    pub client_request_token: Option<String>,
}

#[async_trait]
pub trait TransactWriteItems {
    async fn transact_write_items(
        &self,
        input: TransactWriteItemsInput,
    ) -> Result<TransactWriteItemsOutput, SdkError<TransactWriteItemsError>>;
}

#[async_trait]
impl TransactWriteItems for Adapter {
    async fn transact_write_items(
        &self,
        input: TransactWriteItemsInput,
    ) -> Result<TransactWriteItemsOutput, SdkError<TransactWriteItemsError>> {
        self.raw
            .transact_write_items()
            .set_transact_items(Some(input.items))
            .set_client_request_token(input.client_request_token)
            .send()
            .await
    }
}
