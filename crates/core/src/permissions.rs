//! Tier-based access control for query intents.
//!
//! The allowed sets are static and strictly monotone: each tier extends the
//! one below it, so there is no inheritance ambiguity to resolve at runtime.

use crate::domain::customer::CustomerTier;
use crate::intent::Intent;

const REGULAR_INTENTS: &[Intent] =
    &[Intent::AccountBalance, Intent::TransactionHistory, Intent::GeneralBanking];

const PREMIUM_INTENTS: &[Intent] = &[
    Intent::AccountBalance,
    Intent::TransactionHistory,
    Intent::GeneralBanking,
    Intent::CardServices,
    Intent::InvestmentQuery,
];

const HNI_INTENTS: &[Intent] = &[
    Intent::AccountBalance,
    Intent::TransactionHistory,
    Intent::GeneralBanking,
    Intent::CardServices,
    Intent::InvestmentQuery,
    Intent::RemittanceStatus,
];

const VIP_INTENTS: &[Intent] = &[
    Intent::AccountBalance,
    Intent::TransactionHistory,
    Intent::GeneralBanking,
    Intent::CardServices,
    Intent::InvestmentQuery,
    Intent::RemittanceStatus,
    Intent::LoanInquiry,
];

pub fn allowed_intents(tier: CustomerTier) -> &'static [Intent] {
    match tier {
        CustomerTier::Regular => REGULAR_INTENTS,
        CustomerTier::Premium => PREMIUM_INTENTS,
        CustomerTier::Hni => HNI_INTENTS,
        CustomerTier::Vip => VIP_INTENTS,
    }
}

pub fn is_allowed(tier: CustomerTier, intent: Intent) -> bool {
    allowed_intents(tier).contains(&intent)
}

/// Intents available without any customer identity.
pub fn is_public(intent: Intent) -> bool {
    intent == Intent::GeneralBanking
}

#[cfg(test)]
mod tests {
    use crate::domain::customer::CustomerTier;
    use crate::intent::Intent;

    use super::{allowed_intents, is_allowed, is_public};

    #[test]
    fn each_tier_is_a_strict_superset_of_the_tier_below() {
        let tiers = CustomerTier::ALL;
        for pair in tiers.windows(2) {
            let (lower, higher) = (pair[0], pair[1]);
            let lower_set = allowed_intents(lower);
            let higher_set = allowed_intents(higher);

            for intent in lower_set {
                assert!(
                    higher_set.contains(intent),
                    "{higher} must allow everything {lower} allows, missing {intent}"
                );
            }
            assert!(
                higher_set.len() > lower_set.len(),
                "{higher} must strictly extend {lower}"
            );
        }
    }

    #[test]
    fn regular_tier_cannot_access_remittance_status() {
        assert!(!is_allowed(CustomerTier::Regular, Intent::RemittanceStatus));
        assert!(is_allowed(CustomerTier::Hni, Intent::RemittanceStatus));
    }

    #[test]
    fn loan_inquiry_is_vip_only() {
        assert!(is_allowed(CustomerTier::Vip, Intent::LoanInquiry));
        for tier in [CustomerTier::Regular, CustomerTier::Premium, CustomerTier::Hni] {
            assert!(!is_allowed(tier, Intent::LoanInquiry));
        }
    }

    #[test]
    fn only_general_banking_is_public() {
        assert!(is_public(Intent::GeneralBanking));
        for intent in Intent::ALL {
            if intent != Intent::GeneralBanking {
                assert!(!is_public(intent), "{intent} must not be public");
            }
        }
    }

    #[test]
    fn no_tier_grants_out_of_scope() {
        for tier in CustomerTier::ALL {
            assert!(!is_allowed(tier, Intent::OutOfScope));
        }
    }
}
