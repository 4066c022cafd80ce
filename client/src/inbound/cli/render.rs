//! Plain-text rendering of command results.

use std::io::{self, Write};

use crate::domain::{
    AuthState, BookingWithSalon, FavoriteSalon, ProfileRecord, Route, RouteDecision, Salon,
    ServiceOffering, User,
};

fn offering(service: &ServiceOffering) -> String {
    match (service.price, service.duration) {
        (Some(price), Some(minutes)) => format!("{} (₹{price}, {minutes} min)", service.name),
        (Some(price), None) => format!("{} (₹{price})", service.name),
        (None, Some(minutes)) => format!("{} ({minutes} min)", service.name),
        (None, None) => service.name.clone(),
    }
}

fn rating(salon: &Salon) -> String {
    salon
        .rating
        .map_or_else(|| "unrated".to_owned(), |value| format!("★ {value:.1}"))
}

pub fn salons(out: &mut impl Write, salons: &[Salon]) -> io::Result<()> {
    if salons.is_empty() {
        return writeln!(out, "No salons found.");
    }
    for salon in salons {
        writeln!(
            out,
            "[{}] {} ({}) {}",
            salon.id,
            salon.name,
            salon.location,
            rating(salon)
        )?;
    }
    Ok(())
}

pub fn salon(out: &mut impl Write, salon: &Salon) -> io::Result<()> {
    writeln!(out, "{} [{}]", salon.name, salon.id)?;
    writeln!(out, "  {}", salon.location)?;
    writeln!(out, "  {}", rating(salon))?;
    if let Some(description) = &salon.description {
        writeln!(out, "  {description}")?;
    }
    for service in &salon.services {
        writeln!(out, "  - {}", offering(service))?;
    }
    Ok(())
}

pub fn bookings(out: &mut impl Write, rows: &[BookingWithSalon]) -> io::Result<()> {
    if rows.is_empty() {
        return writeln!(out, "You have no bookings yet.");
    }
    for row in rows {
        let salon = row
            .salon
            .as_ref()
            .map_or("Unknown salon", |salon| salon.name.as_str());
        writeln!(
            out,
            "[{}] {} at {} on {} ({})",
            row.booking.id,
            row.booking.service,
            salon,
            row.booking.booking_date.format("%Y-%m-%d %H:%M"),
            row.booking.status
        )?;
    }
    Ok(())
}

pub fn favorites(out: &mut impl Write, rows: &[FavoriteSalon]) -> io::Result<()> {
    if rows.is_empty() {
        return writeln!(out, "You have no favourite salons yet.");
    }
    for row in rows {
        match &row.salon {
            Some(salon) => writeln!(out, "[{}] {} ({})", salon.id, salon.name, salon.location)?,
            None => writeln!(out, "[{}] salon no longer listed", row.favorite.id)?,
        }
    }
    Ok(())
}

pub fn user(out: &mut impl Write, user: &User) -> io::Result<()> {
    let name = if user.name().is_empty() {
        "(no name)"
    } else {
        user.name()
    };
    writeln!(out, "{name} <{}> as {}", user.email(), user.role().label())
}

pub fn profile(out: &mut impl Write, profile: &ProfileRecord) -> io::Result<()> {
    let field = |value: &Option<String>| value.clone().unwrap_or_else(|| "-".to_owned());
    writeln!(out, "id:     {}", profile.id)?;
    writeln!(out, "name:   {}", field(&profile.full_name))?;
    writeln!(out, "email:  {}", field(&profile.email))?;
    writeln!(out, "role:   {}", field(&profile.role))?;
    writeln!(out, "phone:  {}", field(&profile.phone_number))?;
    writeln!(out, "avatar: {}", field(&profile.avatar_url))
}

pub fn routes(out: &mut impl Write, state: &AuthState) -> io::Result<()> {
    for route in Route::ALL {
        let decision = match route.authorize(state) {
            RouteDecision::Allow => "allowed",
            RouteDecision::RequireLogin => "login required",
            RouteDecision::Forbidden => "forbidden",
        };
        writeln!(out, "{:<13} {decision}", route.path())?;
    }
    Ok(())
}
