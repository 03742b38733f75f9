//! Descriptor-tree frontend adapter for the lyra type engine.
//!
//! A deliberately different internal architecture from `lyra-hir`: instead
//! of interned ids and a flat store, declarations are `Arc`-shared
//! descriptor nodes that point at each other, frozen once declaration
//! completes. Both frontends implement the same
//! [`lyra_api::TypeFacade`] contract and must be interchangeable from the
//! outside.
//!
//! This is the trusting frontend: committing a flexible type does not check
//! bound order.

mod facade;
mod world;

pub use facade::DescTypeFacade;
pub use world::{
    ClassDescriptor, DescArg, DescSymbol, DescTemplate, DescWorld, TypeParameterDescriptor,
};

#[cfg(test)]
#[path = "../tests/contract_tests.rs"]
mod contract_tests;
