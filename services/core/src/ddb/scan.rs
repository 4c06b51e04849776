use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::error::ScanError;
use aws_sdk_dynamodb::model::AttributeValue;
use aws_sdk_dynamodb::output::ScanOutput;
use aws_sdk_dynamodb::types::SdkError;
use typed_builder::TypedBuilder;

use super::adapter::Adapter;

#[derive(Debug, Clone, TypedBuilder)]
pub struct ScanInput {
    #[builder(setter(into))]
    pub table_name: String,

    #[builder(default, setter(strip_option))]
    pub limit: Option<i32>,

    #[builder(default)]
    pub exclusive_start_key: Option<HashMap<String, AttributeValue>>,

    #[builder(default, setter(into))]
    pub filter_expression: Option<String>,

    #[builder(default)]
    pub expression_attribute_names: Option<HashMap<String, String>>,

    #[builder(default)]
    pub expression_attribute_values: Option<HashMap<String, AttributeValue>>,

    #[builder(default = true)]
    pub consistent_read: bool,
}

#[async_trait]
pub trait Scan {
    async fn scan(&self, input: ScanInput) -> Result<ScanOutput, SdkError<ScanError>>;
}

#[async_trait]
impl Scan for Adapter {
    async fn scan(&self, input: ScanInput) -> Result<ScanOutput, SdkError<ScanError>> {
        self.raw
            .scan()
            .table_name(input.table_name)
            .set_limit(input.limit)
            .set_exclusive_start_key(input.exclusive_start_key)
            .set_filter_expression(input.filter_expression)
            .set_expression_attribute_names(input.expression_attribute_names)
            .set_expression_attribute_values(input.expression_attribute_values)
            .consistent_read(input.consistent_read)
            .send()
            .await
    }
}
