//! UTM CLI - demo harness for the UTM delivery core.
//!
//! Provides `demo_scenario`, an in-process walkthrough of `utm_core::Service`
//! exercising planning, conflict resolution and mission lifecycle directly
//! against the library, with no server or network hop involved.
