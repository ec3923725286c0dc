use chrono::NaiveDate;
use rota_catalog::{AddonCatalog, PriceQuote, PricingEngine};
use rota_core::BookingConfirmation;
use rota_shared::{Addon, AttractionProfile, Package, Requirement};
use serde::Serialize;
use uuid::Uuid;

use crate::draft::{BookingDraft, CustomerInfoUpdate};
use crate::steps::{build_steps, BookingStep, StepCapabilities};
use crate::validation::{validate_step, StepBlocker};

/// Per-session settings of a flow, fixed when the wizard opens
#[derive(Debug, Clone)]
pub struct FlowConfig {
    pub attraction_id: Uuid,
    pub base_price: i64,
    pub currency: String,
    pub capabilities: StepCapabilities,
    pub requirements: Vec<Requirement>,
}

impl FlowConfig {
    /// Derives the capability flags from what the attraction actually offers
    pub fn from_attraction(attraction: &AttractionProfile, catalog: &AddonCatalog) -> Self {
        Self {
            attraction_id: attraction.id,
            base_price: attraction.base_price,
            currency: attraction.currency.clone(),
            capabilities: StepCapabilities {
                requires_staff: attraction.requires_staff,
                has_addons: catalog.has_addons(),
                has_packages: catalog.has_packages(),
                has_requirements: !attraction.requirements.is_empty(),
            },
            requirements: attraction.requirements.clone(),
        }
    }
}

/// Why the current step is blocked, for display
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BlockerView {
    pub code: &'static str,
    pub message: String,
}

impl From<&StepBlocker> for BlockerView {
    fn from(blocker: &StepBlocker) -> Self {
        Self {
            code: blocker.code(),
            message: blocker.to_string(),
        }
    }
}

/// Read-only view of a flow for rendering
#[derive(Debug, Clone, Serialize)]
pub struct FlowSnapshot {
    pub attraction_id: Uuid,
    pub draft: BookingDraft,
    pub steps: Vec<BookingStep>,
    pub step_index: usize,
    pub can_proceed: bool,
    pub blocker: Option<BlockerView>,
    pub can_go_back: bool,
    pub is_complete: bool,
    pub quote: PriceQuote,
    pub confirmation: Option<BookingConfirmation>,
}

/// The booking wizard: step sequence, draft and navigation rules.
///
/// Mutators never fail. Out-of-range input is clamped and only step
/// advancement is gated by validation.
#[derive(Debug, Clone)]
pub struct BookingFlow {
    config: FlowConfig,
    catalog: AddonCatalog,
    pricing: PricingEngine,
    steps: Vec<BookingStep>,
    draft: BookingDraft,
    confirmation: Option<BookingConfirmation>,
}

impl BookingFlow {
    pub fn new(config: FlowConfig, catalog: AddonCatalog) -> Self {
        let steps = build_steps(&config.capabilities);
        let pricing = PricingEngine::new(config.base_price, config.currency.clone());
        tracing::debug!(attraction_id = %config.attraction_id, ?steps, "Booking flow opened");
        Self {
            config,
            catalog,
            pricing,
            steps,
            draft: BookingDraft::default(),
            confirmation: None,
        }
    }

    pub fn for_attraction(attraction: &AttractionProfile, catalog: AddonCatalog) -> Self {
        Self::new(FlowConfig::from_attraction(attraction, &catalog), catalog)
    }

    pub fn config(&self) -> &FlowConfig {
        &self.config
    }

    pub fn catalog(&self) -> &AddonCatalog {
        &self.catalog
    }

    pub fn draft(&self) -> &BookingDraft {
        &self.draft
    }

    pub fn steps(&self) -> &[BookingStep] {
        &self.steps
    }

    pub fn current_step(&self) -> BookingStep {
        self.draft.step
    }

    pub fn step_index(&self) -> usize {
        self.steps
            .iter()
            .position(|s| *s == self.draft.step)
            .unwrap_or(0)
    }

    pub fn confirmation(&self) -> Option<&BookingConfirmation> {
        self.confirmation.as_ref()
    }

    // Validation

    pub fn validate_step(&self, step: BookingStep) -> Result<(), StepBlocker> {
        validate_step(step, &self.draft, &self.config.requirements)
    }

    pub fn can_proceed(&self) -> bool {
        self.validate_step(self.draft.step).is_ok()
    }

    pub fn can_go_back(&self) -> bool {
        self.step_index() > 0 && self.draft.step != BookingStep::Confirmation
    }

    pub fn is_complete(&self) -> bool {
        self.draft.step == BookingStep::Confirmation
    }

    // Navigation

    /// Advances one step if the current one is valid. Returns whether it moved.
    pub fn next_step(&mut self) -> bool {
        if let Err(blocker) = self.validate_step(self.draft.step) {
            tracing::debug!(step = %self.draft.step, reason = %blocker, "Step blocked");
            return false;
        }
        match self.steps.get(self.step_index() + 1) {
            Some(next) => {
                self.move_to(*next);
                true
            }
            None => false,
        }
    }

    pub fn prev_step(&mut self) -> bool {
        if !self.can_go_back() {
            return false;
        }
        let previous = self.steps[self.step_index() - 1];
        self.move_to(previous);
        true
    }

    /// Jumps to any step of this session's sequence. Confirmation can be
    /// neither left nor entered this way.
    pub fn go_to_step(&mut self, step: BookingStep) -> bool {
        if !self.steps.contains(&step)
            || self.is_complete()
            || step == BookingStep::Confirmation
        {
            return false;
        }
        self.move_to(step);
        true
    }

    fn move_to(&mut self, step: BookingStep) {
        tracing::info!(
            attraction_id = %self.config.attraction_id,
            from = %self.draft.step,
            to = %step,
            "Booking step changed"
        );
        self.draft.step = step;
    }

    // Date and time

    /// A new date drops the previously chosen slot
    pub fn select_date(&mut self, date: NaiveDate) {
        self.draft.selected_date = Some(date);
        self.draft.selected_slot_id = None;
        self.draft.selected_time.clear();
    }

    pub fn select_slot(&mut self, slot_id: Uuid, time: impl Into<String>) {
        self.draft.selected_slot_id = Some(slot_id);
        self.draft.selected_time = time.into();
    }

    pub fn select_staff(&mut self, staff_id: Option<Uuid>) {
        self.draft.selected_staff_id = staff_id;
    }

    pub fn set_party_size(&mut self, size: i64) {
        self.draft.party_size = u32::try_from(size.max(1)).unwrap_or(u32::MAX);
    }

    // Add-ons and packages

    /// Quantity <= 0 removes the add-on; anything else is capped at its limit
    pub fn update_addon(&mut self, addon_id: Uuid, quantity: i64) {
        if quantity <= 0 {
            self.draft.selected_addons.shift_remove(&addon_id);
            return;
        }
        let limit = self
            .catalog
            .addon_by_id(&addon_id)
            .map_or(Addon::DEFAULT_MAX_QUANTITY, Addon::quantity_limit);
        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX).min(limit);
        self.draft.selected_addons.insert(addon_id, quantity);
    }

    pub fn increment_addon(&mut self, addon_id: Uuid) {
        let current = self.addon_quantity(&addon_id);
        self.update_addon(addon_id, i64::from(current) + 1);
    }

    pub fn decrement_addon(&mut self, addon_id: Uuid) {
        let current = self.addon_quantity(&addon_id);
        self.update_addon(addon_id, i64::from(current) - 1);
    }

    pub fn remove_addon(&mut self, addon_id: Uuid) {
        self.draft.selected_addons.shift_remove(&addon_id);
    }

    pub fn clear_addons(&mut self) {
        self.draft.selected_addons.clear();
    }

    pub fn addon_quantity(&self, addon_id: &Uuid) -> u32 {
        self.draft.selected_addons.get(addon_id).copied().unwrap_or(0)
    }

    /// Selecting a package replaces any individually chosen add-ons.
    /// Clearing the package leaves add-ons alone.
    pub fn select_package(&mut self, package_id: Option<Uuid>) {
        if package_id.is_some() {
            self.draft.selected_addons.clear();
        }
        self.draft.selected_package_id = package_id;
    }

    // Customer details

    pub fn update_customer_info(&mut self, update: CustomerInfoUpdate) {
        update.apply_to(&mut self.draft.customer_info);
    }

    pub fn update_custom_field(&mut self, field_id: impl Into<String>, value: serde_json::Value) {
        self.draft.custom_field_responses.insert(field_id.into(), value);
    }

    /// Checkbox semantics: a second call removes the acknowledgement
    pub fn acknowledge_requirement(&mut self, requirement_id: Uuid) {
        if !self.draft.acknowledged_requirements.shift_remove(&requirement_id) {
            self.draft.acknowledged_requirements.insert(requirement_id);
        }
    }

    // Lifecycle

    pub fn reset(&mut self) {
        self.draft = BookingDraft::default();
        self.confirmation = None;
    }

    /// Sends the customer back to pick another slot after the one they chose
    /// filled up
    pub fn return_to_slot_selection(&mut self) {
        self.draft.selected_slot_id = None;
        self.draft.selected_time.clear();
        self.move_to(BookingStep::Time);
    }

    pub fn record_confirmation(&mut self, confirmation: BookingConfirmation) {
        self.confirmation = Some(confirmation);
        self.move_to(BookingStep::Confirmation);
    }

    // Pricing

    pub fn quote(&self) -> PriceQuote {
        self.pricing.quote(
            &self.catalog,
            &self.draft.selected_addons,
            self.draft.selected_package_id,
            self.draft.party_size,
        )
    }

    pub fn addon_total(&self) -> i64 {
        self.pricing
            .addon_total(&self.catalog, &self.draft.selected_addons, self.draft.party_size)
    }

    pub fn calculate_total(&self) -> i64 {
        self.quote().total
    }

    pub fn package_savings(&self) -> i64 {
        self.pricing.package_savings(
            &self.catalog,
            self.draft.selected_package_id,
            self.draft.party_size,
        )
    }

    pub fn package_price(&self) -> Option<i64> {
        self.selected_package().map(|p| p.price)
    }

    pub fn selected_package(&self) -> Option<&Package> {
        self.draft
            .selected_package_id
            .and_then(|id| self.catalog.package_by_id(&id))
    }

    pub fn available_addons(&self) -> Vec<&Addon> {
        self.catalog.available_addons(
            self.draft.party_size,
            self.draft.selected_date,
            self.draft.selected_staff_id,
        )
    }

    pub fn available_packages(&self) -> Vec<&Package> {
        self.catalog
            .available_packages(self.draft.party_size, self.draft.selected_date)
    }

    pub fn snapshot(&self) -> FlowSnapshot {
        let blocker = self.validate_step(self.draft.step).err();
        FlowSnapshot {
            attraction_id: self.config.attraction_id,
            draft: self.draft.clone(),
            steps: self.steps.clone(),
            step_index: self.step_index(),
            can_proceed: blocker.is_none(),
            blocker: blocker.as_ref().map(BlockerView::from),
            can_go_back: self.can_go_back(),
            is_complete: self.is_complete(),
            quote: self.quote(),
            confirmation: self.confirmation.clone(),
        }
    }
}
