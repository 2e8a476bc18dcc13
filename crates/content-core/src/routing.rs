//! Freemium routing state machine.
//!
//! A pure function of the session's observable inputs. Several predicates
//! can be true at once, so evaluation order is the design: loading and
//! error preempt everything (never show a paywall while still fetching),
//! the intro is shown even to connected, paying users who have not
//! dismissed it once, and the paywall is evaluated only after the intro so
//! the free-trial clock visibly starts once the user has engaged.

/// Content days visible to non-subscribers before the paywall activates.
pub const FREE_DAY_LIMIT: u32 = 3;

/// Where the UI should send the user. Derived, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutingState {
    /// Still fetching; show a spinner.
    Loading,
    /// A sync or generation error; show a retry affordance.
    Error(String),
    /// First-run intro; `show_connect` asks for the partner-connect step.
    Intro { show_connect: bool },
    /// Free-day limit exceeded without a subscription.
    Paywall { day: u32 },
    /// The regular daily-content screen.
    Main,
}

/// Inputs to [`route`]. All other engine components feed this.
#[derive(Debug, Clone, Default)]
pub struct RouteInputs {
    pub has_connected_partner: bool,
    pub has_seen_intro: bool,
    pub is_subscribed: bool,
    pub current_day: u32,
    pub free_day_limit: u32,
    pub error: Option<String>,
    pub is_loading: bool,
}

/// Compute the routing state. First match wins.
pub fn route(inputs: &RouteInputs) -> RoutingState {
    if inputs.is_loading {
        return RoutingState::Loading;
    }
    if let Some(message) = &inputs.error {
        return RoutingState::Error(message.clone());
    }
    if !inputs.has_seen_intro {
        return RoutingState::Intro {
            show_connect: !inputs.has_connected_partner,
        };
    }
    if !inputs.is_subscribed && inputs.current_day > inputs.free_day_limit {
        return RoutingState::Paywall {
            day: inputs.current_day,
        };
    }
    RoutingState::Main
}
