//! Type-state markers for the builder pattern
//!
//! These types track at compile time whether an endpoint (URL or custom
//! transport) has been configured.

use std::marker::PhantomData;

/// Marker trait for endpoint state
pub trait EndpointState {}

/// Neither a URL nor a transport has been set
pub struct NoEndpoint;
impl EndpointState for NoEndpoint {}

/// A URL or a transport has been set
pub struct HasEndpoint;
impl EndpointState for HasEndpoint {}

/// Phantom marker to prevent direct construction
#[derive(Debug, Clone, Copy)]
pub struct TypeState<S> {
    _endpoint: PhantomData<S>,
}

impl<S> TypeState<S> {
    pub(crate) fn new() -> Self {
        Self {
            _endpoint: PhantomData,
        }
    }
}

impl<S> Default for TypeState<S> {
    fn default() -> Self {
        Self::new()
    }
}
