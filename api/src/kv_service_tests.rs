use crate::error::KvError;
use crate::kv_service::KvService;
use crate::transport::Delivery;
use crate::types::{GetRequest, PutRequest};

/// Defines a `KvServiceTestSuite` that any reliable (`unreliable = false`) [`KvService`]
/// backend must pass to be protocol compliant: version monotonicity, the `Put` decision table,
/// and reply-cache idempotence under a duplicated `(client_id, seq)`.
#[macro_export]
macro_rules! define_kv_service_tests {
	($test_suite_name:ident, $service_type:path, $create_service_expr:expr) => {
		use $crate::error::KvError;
		use $crate::kv_service_tests::KvServiceTestSuite;

		struct $test_suite_name;

		#[async_trait::async_trait]
		impl KvServiceTestSuite for $test_suite_name {
			type Service = $service_type;

			async fn create_service() -> Self::Service {
				$create_service_expr
			}
		}

		macro_rules! create_test {
			($test_fn:ident) => {
				#[tokio::test]
				async fn $test_fn() {
					$test_suite_name::$test_fn().await;
				}
			};
		}

		create_test!(create_then_update_advances_version_by_one);
		create_test!(put_on_absent_key_with_nonzero_version_is_no_key);
		create_test!(put_with_stale_version_is_rejected_and_state_is_unchanged);
		create_test!(get_on_absent_key_is_no_key);
		create_test!(version_sequence_has_no_gaps_or_repeats);
		create_test!(duplicate_request_returns_cached_reply_and_does_not_reapply);
	};
}

/// Contains the shared test bodies instantiated by [`define_kv_service_tests!`].
#[async_trait::async_trait]
pub trait KvServiceTestSuite {
	/// The [`KvService`] implementation under test.
	type Service: KvService + 'static;

	/// Creates a fresh, empty instance of the service under test.
	async fn create_service() -> Self::Service;

	async fn create_then_update_advances_version_by_one() {
		let service = Self::create_service().await;

		put(&service, "hello", "world", 0, "c1", 1).await.unwrap();
		let kv = get(&service, "hello", "c1", 2).await.unwrap();
		assert_eq!((kv.value.as_str(), kv.version), ("world", 1));

		put(&service, "hello", "universe", 1, "c1", 3).await.unwrap();
		let kv = get(&service, "hello", "c1", 4).await.unwrap();
		assert_eq!((kv.value.as_str(), kv.version), ("universe", 2));
	}

	async fn put_on_absent_key_with_nonzero_version_is_no_key() {
		let service = Self::create_service().await;

		let err = put(&service, "nope", "v", 3, "c1", 1).await.unwrap_err();
		assert_eq!(err, KvError::NoKey);
	}

	async fn put_with_stale_version_is_rejected_and_state_is_unchanged() {
		let service = Self::create_service().await;

		put(&service, "hello", "world", 0, "c1", 1).await.unwrap();
		put(&service, "hello", "universe", 1, "c1", 2).await.unwrap();

		let err = put(&service, "hello", "x", 5, "c1", 3).await.unwrap_err();
		assert_eq!(err, KvError::Version);

		let kv = get(&service, "hello", "c1", 4).await.unwrap();
		assert_eq!((kv.value.as_str(), kv.version), ("universe", 2));
	}

	async fn get_on_absent_key_is_no_key() {
		let service = Self::create_service().await;

		let err = get(&service, "nope", "c1", 1).await.unwrap_err();
		assert_eq!(err, KvError::NoKey);
	}

	async fn version_sequence_has_no_gaps_or_repeats() {
		let service = Self::create_service().await;

		put(&service, "k", "v0", 0, "c1", 1).await.unwrap();
		for expected_prior_version in 1..10u64 {
			put(&service, "k", "vnext", expected_prior_version, "c1", expected_prior_version + 1)
				.await
				.unwrap();
			let kv = get(&service, "k", "c1", expected_prior_version + 2).await.unwrap();
			assert_eq!(kv.version, expected_prior_version + 1);
		}
	}

	async fn duplicate_request_returns_cached_reply_and_does_not_reapply() {
		let service = Self::create_service().await;

		put(&service, "k", "first", 0, "c1", 1).await.unwrap();

		// Replaying the exact same (client_id, seq) as a later, unrelated write must return
		// the original cached reply and must not advance the version a second time.
		put(&service, "k", "first", 0, "c1", 1).await.unwrap();

		let kv = get(&service, "k", "c1", 2).await.unwrap();
		assert_eq!((kv.value.as_str(), kv.version), ("first", 1));
	}
}

async fn get(
	service: &(impl KvService + ?Sized), key: &str, client_id: &str, seq: u64,
) -> Result<crate::types::KeyVersion, KvError> {
	let request = GetRequest { key: key.to_string(), client_id: client_id.to_string(), seq };
	match service.get(request).await {
		Delivery::Delivered(reply) => reply,
		Delivery::Dropped => panic!("reliable test service dropped a request"),
	}
}

async fn put(
	service: &(impl KvService + ?Sized), key: &str, value: &str, version: u64, client_id: &str,
	seq: u64,
) -> Result<(), KvError> {
	let request = PutRequest {
		key: key.to_string(),
		value: value.to_string(),
		version,
		client_id: client_id.to_string(),
		seq,
	};
	match service.put(request).await {
		Delivery::Delivered(reply) => reply,
		Delivery::Dropped => panic!("reliable test service dropped a request"),
	}
}
