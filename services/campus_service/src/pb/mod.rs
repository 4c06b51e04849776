pub mod conversion;

tonic::include_proto!("campus_service");
