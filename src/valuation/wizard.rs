//! Multi-step valuation form.
//!
//! Steps run `Location -> Attributes -> Result`. Leaving `Location` needs a
//! neighborhood; leaving `Attributes` sends exactly one prediction request.

use log::{debug, error};

use super::{shape_floors, PropertyType, ValuationClient, ValuationRequest, ValuationResponse};
use crate::error::Error;

/// City preselected in the form
pub const DEFAULT_CITY: &str = "Amman";

/// Shown when a prediction fails without a server detail
pub const VALUATION_FAILED: &str = "Unable to estimate the price right now. Please try again.";

/// Step of the wizard
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WizardStep {
    Location,
    Attributes,
    Result,
}

impl WizardStep {
    /// 1-based position, for progress bars
    pub fn number(&self) -> u8 {
        match self {
            WizardStep::Location => 1,
            WizardStep::Attributes => 2,
            WizardStep::Result => 3,
        }
    }

    pub const COUNT: u8 = 3;
}

/// Inputs collected by the wizard
#[derive(Debug, Clone, PartialEq)]
pub struct ValuationForm {
    pub city: String,
    pub neighborhood: String,
    pub property_type: PropertyType,
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub area_sqm: f64,
    /// Floor of the unit (apartments)
    pub floor: i32,
    /// Number of floors of the building (every other type)
    pub total_floors: i32,
    pub building_age: u32,
    pub furnished: bool,
}

impl Default for ValuationForm {
    fn default() -> Self {
        Self {
            city: DEFAULT_CITY.to_string(),
            neighborhood: String::new(),
            property_type: PropertyType::Apartment,
            bedrooms: 3,
            bathrooms: 2,
            area_sqm: 150.0,
            floor: 2,
            total_floors: 2,
            building_age: 5,
            furnished: true,
        }
    }
}

impl ValuationForm {
    /// Whether a neighborhood has been picked
    pub fn has_location(&self) -> bool {
        !self.neighborhood.trim().is_empty()
    }

    /// Shape the prediction payload
    pub fn to_request(&self) -> Result<ValuationRequest, Error> {
        if !self.has_location() {
            return Err(Error::validation("Please select a neighborhood"));
        }
        if !(self.area_sqm > 0.0) {
            return Err(Error::validation("Area must be greater than zero"));
        }

        let (floor, total_floors) = shape_floors(self.property_type, self.floor, self.total_floors);

        Ok(ValuationRequest {
            bedrooms: self.bedrooms,
            bathrooms: self.bathrooms,
            area_sqm: self.area_sqm,
            property_type: self.property_type,
            furnished: self.furnished,
            floor,
            total_floors,
            building_age: self.building_age,
            city: self.city.trim().to_string(),
            neighborhood: self.neighborhood.trim().to_string(),
        })
    }
}

/// Outcome shown on the result step
#[derive(Debug, Clone, PartialEq)]
pub enum Estimate {
    NotRequested,
    Pending,
    /// Estimated price in JOD
    Ready(f64),
    Failed(String),
}

/// Identifies one submission started by [`ValuationWizard::begin_submit`]
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitTicket {
    generation: u64,
    /// The payload to send
    pub request: ValuationRequest,
}

/// The valuation wizard
#[derive(Debug, Clone)]
pub struct ValuationWizard {
    step: WizardStep,
    form: ValuationForm,
    estimate: Estimate,
    generation: u64,
}

impl Default for ValuationWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl ValuationWizard {
    pub fn new() -> Self {
        Self {
            step: WizardStep::Location,
            form: ValuationForm::default(),
            estimate: Estimate::NotRequested,
            generation: 0,
        }
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn form(&self) -> &ValuationForm {
        &self.form
    }

    /// Edit the inputs. Edits are ignored once a result is showing.
    pub fn form_mut(&mut self) -> Option<&mut ValuationForm> {
        if self.step == WizardStep::Result {
            None
        } else {
            Some(&mut self.form)
        }
    }

    pub fn estimate(&self) -> &Estimate {
        &self.estimate
    }

    /// Whether a prediction request is outstanding
    pub fn is_pending(&self) -> bool {
        self.estimate == Estimate::Pending
    }

    /// Move from `Location` to `Attributes`
    pub fn advance(&mut self) -> Result<WizardStep, Error> {
        match self.step {
            WizardStep::Location if self.form.has_location() => {
                self.step = WizardStep::Attributes;
                Ok(self.step)
            }
            WizardStep::Location => Err(Error::validation("Please select a neighborhood")),
            WizardStep::Attributes => Err(Error::validation(
                "Submit the property details to get an estimate",
            )),
            WizardStep::Result => Ok(self.step),
        }
    }

    /// Go back one step; stays on `Location`. Leaving the result step
    /// abandons any outstanding request.
    pub fn back(&mut self) -> WizardStep {
        self.step = match self.step {
            WizardStep::Location | WizardStep::Attributes => WizardStep::Location,
            WizardStep::Result => {
                self.generation += 1;
                self.estimate = Estimate::NotRequested;
                WizardStep::Attributes
            }
        };
        self.step
    }

    /// Start a prediction from the `Attributes` step
    pub fn begin_submit(&mut self) -> Result<SubmitTicket, Error> {
        if self.step != WizardStep::Attributes {
            return Err(Error::validation("Property details are not complete"));
        }
        let request = self.form.to_request()?;

        self.generation += 1;
        self.step = WizardStep::Result;
        self.estimate = Estimate::Pending;

        Ok(SubmitTicket {
            generation: self.generation,
            request,
        })
    }

    /// Store a prediction outcome. Returns `false` if the submission was
    /// abandoned in the meantime.
    pub fn complete_submit(
        &mut self,
        ticket: SubmitTicket,
        result: Result<ValuationResponse, Error>,
    ) -> bool {
        if ticket.generation != self.generation {
            debug!("Dropping abandoned valuation response");
            return false;
        }

        self.estimate = match result {
            Ok(response) => Estimate::Ready(response.price_jod),
            Err(err) => {
                error!("Price prediction failed: {}", err);
                let message = match &err {
                    Error::Api { status, detail } if (400..500).contains(status) => detail.clone(),
                    Error::Validation(msg) => msg.clone(),
                    _ => VALUATION_FAILED.to_string(),
                };
                Estimate::Failed(message)
            }
        };
        true
    }

    /// Submit the form and wait for the estimate
    pub async fn submit(&mut self, client: &ValuationClient) -> Result<&Estimate, Error> {
        let ticket = self.begin_submit()?;
        let result = client.predict(&ticket.request).await;
        self.complete_submit(ticket, result);
        Ok(&self.estimate)
    }

    /// Clear every input and return to the first step
    pub fn restart(&mut self) {
        self.generation += 1;
        self.step = WizardStep::Location;
        self.form = ValuationForm::default();
        self.estimate = Estimate::NotRequested;
    }
}
