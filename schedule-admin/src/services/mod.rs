// Business logic services layer
//
// Operations that combine repositories with the external scheduler.

pub mod scheduling;
