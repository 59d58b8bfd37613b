// Business logic services

pub mod activity_service;
pub mod assessment_service;
pub mod chat_responder;
pub mod chatbot_service;
pub mod coin_service;
pub mod food_service;
pub mod health_profile_service;
pub mod risk_scorer;

pub use activity_service::ActivityService;
pub use assessment_service::AssessmentService;
pub use chat_responder::ChatResponder;
pub use chatbot_service::ChatbotService;
pub use coin_service::CoinService;
pub use food_service::FoodService;
pub use health_profile_service::HealthProfileService;
pub use risk_scorer::RiskScorer;
