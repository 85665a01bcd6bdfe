//! Demo catalog loaded into an empty store: five popular categories, an intake
//! flow for painting and cleaning, and a handful of services.

use crate::errors::AppError;
use crate::flow::validate::validate_flow;
use crate::flow::{ConditionalNext, Flow, Step, StepOption, StepType};
use crate::models::category::NewCategory;
use crate::models::service::NewService;
use crate::store::CatalogStore;

const CATEGORIES: [(&str, &str, &str); 5] = [
    ("Painting", "Professional interior and exterior painting for your home", "🎨"),
    ("Renovation", "All kinds of home repair and renovation work", "🔨"),
    ("Plumbing", "Water, electricity and gas installation and repair", "🔧"),
    ("Cleaning", "Thorough cleaning services for your home", "🧹"),
    ("Moving", "Home and office moving services", "🚚"),
];

/// Seed the catalog when it has no categories. Returns whether anything was written.
pub async fn seed(catalog: &dyn CatalogStore) -> Result<bool, AppError> {
    if !catalog.list_categories().await?.is_empty() {
        return Ok(false);
    }

    let mut ids = Vec::with_capacity(CATEGORIES.len());
    for (name, description, icon) in CATEGORIES {
        let id = catalog
            .create_category(&NewCategory {
                name: name.to_string(),
                description: Some(description.to_string()),
                icon: Some(icon.to_string()),
                parent_id: None,
                is_popular: true,
            })
            .await?;
        ids.push(id);
    }
    let (painting, renovation, cleaning, moving) = (ids[0], ids[1], ids[3], ids[4]);

    for flow in [paint_flow(painting), cleaning_flow(cleaning)] {
        validate_flow(&flow)?;
        catalog.save_flow(&flow).await?;
    }

    for service in services(painting, renovation, cleaning, moving) {
        catalog.create_service(&service).await?;
    }

    log::info!("Seeded {} demo categories", ids.len());
    Ok(true)
}

fn choice(id: &str, label: &str, value: &str) -> StepOption {
    StepOption { id: id.to_string(), label: label.to_string(), value: value.to_string() }
}

fn step(id: &str, order: i64, title: &str, question: &str, step_type: StepType) -> Step {
    Step {
        title: title.to_string(),
        question: question.to_string(),
        step_type,
        ..Step::blank(id, order)
    }
}

fn then(mut step: Step, next: &str) -> Step {
    step.next_step = Some(next.to_string());
    step
}

/// Nine-step painting intake. Step 3 branches: a brand preference leads to the
/// brand question, otherwise it skips straight to the ceiling question.
pub fn paint_flow(category_id: i64) -> Flow {
    let steps = vec![
        then(
            Step {
                options: vec![
                    choice("opt-1", "Interior painting", "interior"),
                    choice("opt-2", "Exterior painting", "exterior"),
                    choice("opt-3", "Both", "interior-exterior"),
                ],
                ..step("step-1", 1, "Paint type", "Which painting job do you need done?", StepType::Radio)
            },
            "step-2",
        ),
        then(
            Step {
                options: vec![
                    choice("opt-4", "50 m² or less", "50-or-less"),
                    choice("opt-5", "51-100 m²", "51-100"),
                    choice("opt-6", "101-150 m²", "101-150"),
                    choice("opt-7", "151-200 m²", "151-200"),
                    choice("opt-8", "201 m² or more", "201-or-more"),
                ],
                ..step("step-2", 2, "Area", "Roughly how many square metres will be painted?", StepType::Radio)
            },
            "step-3",
        ),
        Step {
            options: vec![
                choice("opt-9", "Yes", "yes"),
                choice("opt-10", "No, the painter can recommend one", "no"),
            ],
            conditional_next_step: vec![
                ConditionalNext { option_id: "opt-9".into(), next_step_id: "step-4".into() },
                ConditionalNext { option_id: "opt-10".into(), next_step_id: "step-5".into() },
            ],
            ..step("step-3", 3, "Paint brand", "Do you have a preferred paint brand?", StepType::Radio)
        },
        then(
            Step {
                options: vec![
                    choice("opt-11", "Dulux", "dulux"),
                    choice("opt-12", "Benjamin Moore", "benjamin-moore"),
                    choice("opt-13", "Sherwin-Williams", "sherwin-williams"),
                    choice("opt-14", "Farrow & Ball", "farrow-ball"),
                    choice("opt-15", "Jotun", "jotun"),
                    choice("opt-16", "Other", "other"),
                ],
                ..step("step-4", 4, "Brand", "Which paint brand do you prefer?", StepType::Select)
            },
            "step-5",
        ),
        then(
            Step {
                options: vec![choice("opt-17", "Yes", "yes"), choice("opt-18", "No", "no")],
                ..step("step-5", 5, "Ceiling", "Should the ceilings be painted too?", StepType::Radio)
            },
            "step-6",
        ),
        then(
            step("step-6", 6, "Start date", "When would you like the work to start?", StepType::Date),
            "step-7",
        ),
        then(
            Step {
                required: false,
                placeholder: Some("Write any special requests here...".to_string()),
                ..step("step-7", 7, "Notes", "Anything else the painter should know?", StepType::Textarea)
            },
            "step-8",
        ),
        then(
            step("step-8", 8, "Address", "Where should the service take place?", StepType::Address),
            "step-9",
        ),
        step("step-9", 9, "Contact details", "How can we reach you?", StepType::Text),
    ];

    Flow { id: 0, category_id, initial_step_id: "step-1".to_string(), steps }
}

/// Short linear cleaning intake.
pub fn cleaning_flow(category_id: i64) -> Flow {
    let steps = vec![
        then(
            Step {
                options: vec![
                    choice("opt-1", "Apartment", "apartment"),
                    choice("opt-2", "House", "house"),
                    choice("opt-3", "Office", "office"),
                ],
                ..step("step-1", 1, "Property", "What kind of place needs cleaning?", StepType::Radio)
            },
            "step-2",
        ),
        then(
            step("step-2", 2, "Preferred time", "What time of day suits you best?", StepType::Time),
            "step-3",
        ),
        then(
            step("step-3", 3, "Address", "Where should the service take place?", StepType::Address),
            "step-4",
        ),
        step("step-4", 4, "Contact details", "How can we reach you?", StepType::Text),
    ];

    Flow { id: 0, category_id, initial_step_id: "step-1".to_string(), steps }
}

fn services(painting: i64, renovation: i64, cleaning: i64, moving: i64) -> Vec<NewService> {
    let service = |name: &str, description: &str, price_cents: i64, duration_minutes: i32, category_id: i64, provider: &str| {
        NewService {
            name: name.to_string(),
            description: description.to_string(),
            price_cents,
            duration_minutes,
            category_id,
            provider_name: provider.to_string(),
        }
    };
    vec![
        service("Room painting", "Walls and ceiling of one room, materials included", 45000, 480, painting, "Bright Walls"),
        service("Facade painting", "Exterior walls up to two storeys", 220000, 1440, painting, "Bright Walls"),
        service("Bathroom refit", "Tiles, fixtures and sealing", 350000, 2880, renovation, "Solid Build"),
        service("Deep clean", "Full apartment deep clean", 12000, 240, cleaning, "Sparkle Team"),
        service("Office cleaning", "Weekly office cleaning up to 200 m²", 18000, 180, cleaning, "Sparkle Team"),
        service("Local move", "Two movers and a van within the city", 60000, 360, moving, "Swift Movers"),
    ]
}
