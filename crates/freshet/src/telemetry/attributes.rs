// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#[cfg(any(feature = "metrics", test))]
pub(crate) const CACHE_NAMESPACE: &str = "cache.namespace";

#[cfg(any(feature = "metrics", test))]
pub(crate) const CACHE_OPERATION: &str = "cache.operation";

#[cfg(any(feature = "metrics", test))]
pub(crate) const CACHE_ACTIVITY: &str = "cache.activity";

#[cfg(test)]
pub(crate) const CACHE_EVENT: &str = "cache.event";
