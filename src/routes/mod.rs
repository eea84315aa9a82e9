use actix_web::web;

pub mod backend_health;
pub mod players;
pub mod matches;
pub mod shots;
pub mod admin;

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(backend_health::backend_health);

    cfg.service(
        web::scope("/players")
            .service(players::create_player)
            .service(players::list_players)
            .service(players::get_player)
            .service(players::get_matchups)
            .service(players::get_partners)
    );
    cfg.service(
        web::scope("/matches")
            .service(matches::create_match)
            .service(matches::get_match_history)
            .service(matches::get_match)
            .service(matches::get_remaining_cups)
            .service(matches::get_recap)
            .service(matches::end_match)
            .service(matches::undo_shot)
    );
    cfg.service(
        web::scope("/shots")
            .service(shots::record_shot)
            .service(shots::record_bounce)
    );
    // Maintenance operations
    cfg.service(
        web::scope("/admin")
            .service(admin::run_backfill)
            .service(admin::cleanup_ongoing)
    );
}
