//! Plain-text tables and bar charts.

use std::fmt::Write as _;

use crate::models::{
    AvailableTickets, Booking, BookingStatus, BookingWithDetails, BusiestVenue, EventRevenue,
    EventWithDetails, MonthlyRevenue, PopularEvent, SystemStats, TicketType, TicketTypeAnalysis,
    TicketTypeStats, VenueOccupancy, VenueWithEvents,
};

const BAR_WIDTH: usize = 30;

pub fn money(amount: f64) -> String {
    format!("${:.2}", amount)
}

/// Horizontal bar scaled so that `max` fills `width` cells.
pub fn bar(value: f64, max: f64, width: usize) -> String {
    if max <= 0.0 || value <= 0.0 {
        return String::new();
    }
    let cells = ((value / max) * width as f64).round() as usize;
    "█".repeat(cells.clamp(1, width))
}

/// Left-aligned table with a header rule. Widths are measured in chars.
pub fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(widths.len()) {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();

    let mut out = String::new();
    out.push_str(&table_line(headers.iter().copied(), &widths));
    out.push_str(&table_line(rule.iter().map(String::as_str), &widths));
    for row in rows {
        out.push_str(&table_line(row.iter().map(String::as_str), &widths));
    }
    out
}

fn table_line<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    let padded: Vec<String> = cells
        .zip(widths)
        .map(|(cell, width)| {
            let pad = width.saturating_sub(cell.chars().count());
            format!("{}{}", cell, " ".repeat(pad))
        })
        .collect();
    format!("{}\n", padded.join("  ").trim_end())
}

/// Labelled bar chart; labels are padded to a common width.
pub fn bar_chart(title: &str, items: &[(String, f64)], format_value: fn(f64) -> String) -> String {
    let mut out = format!("{}\n", title);
    if items.is_empty() {
        out.push_str("  (no data)\n");
        return out;
    }

    let label_width = items.iter().map(|(label, _)| label.chars().count()).max().unwrap_or(0);
    let max = items.iter().map(|(_, value)| *value).fold(0.0, f64::max);
    for (label, value) in items {
        let pad = label_width - label.chars().count();
        let _ = writeln!(
            out,
            "  {}{}  {} {}",
            label,
            " ".repeat(pad),
            bar(*value, max, BAR_WIDTH),
            format_value(*value)
        );
    }
    out
}

fn count(value: f64) -> String {
    format!("{}", value as i64)
}

pub fn overview(
    stats: &SystemStats,
    popular: &[PopularEvent],
    busiest: &[BusiestVenue],
    monthly: &[MonthlyRevenue],
) -> String {
    let o = &stats.overview;
    let mut out = String::from("== Key metrics ==\n");
    let _ = writeln!(out, "  Venues:        {}", o.total_venues);
    let _ = writeln!(out, "  Events:        {}", o.total_events);
    let _ = writeln!(out, "  Ticket types:  {}", o.total_ticket_types);
    let _ = writeln!(out, "  Bookings:      {}", o.total_bookings);
    let _ = writeln!(out, "  Tickets sold:  {}", o.total_tickets_sold);
    out.push('\n');

    let revenue = vec![
        ("Confirmed".to_string(), stats.revenue.confirmed_revenue),
        ("Pending".to_string(), stats.revenue.pending_revenue),
    ];
    out.push_str(&bar_chart("== Revenue ==", &revenue, money));
    out.push('\n');

    let statuses: Vec<(String, f64)> = stats
        .booking_status_breakdown
        .iter()
        .map(|(status, summary)| (status.to_string(), summary.booking_count as f64))
        .collect();
    out.push_str(&bar_chart("== Bookings by status ==", &statuses, count));
    out.push('\n');

    out.push_str("== Popular events ==\n");
    let rows: Vec<Vec<String>> = popular
        .iter()
        .map(|e| {
            vec![
                e.event_name.clone(),
                format!("{} ({})", e.venue_name, e.venue_city),
                e.booking_count.to_string(),
                e.total_tickets.to_string(),
                money(e.total_revenue),
            ]
        })
        .collect();
    out.push_str(&table(&["Event", "Venue", "Bookings", "Tickets", "Revenue"], &rows));
    out.push('\n');

    out.push_str("== Busiest venues ==\n");
    let rows: Vec<Vec<String>> = busiest
        .iter()
        .map(|v| {
            vec![
                v.venue_name.clone(),
                v.city.clone(),
                v.event_count.to_string(),
                v.total_tickets.to_string(),
                format!("{:.2}%", v.occupancy_rate),
                money(v.total_revenue),
            ]
        })
        .collect();
    out.push_str(&table(&["Venue", "City", "Events", "Tickets", "Occupancy", "Revenue"], &rows));
    out.push('\n');

    let months: Vec<(String, f64)> = monthly.iter().map(|m| (m.month.clone(), m.revenue)).collect();
    out.push_str(&bar_chart("== Revenue by month ==", &months, money));
    out
}

pub fn venues(venues: &[VenueWithEvents]) -> String {
    let rows: Vec<Vec<String>> = venues
        .iter()
        .map(|v| {
            vec![
                v.venue.id.to_string(),
                v.venue.name.clone(),
                v.venue.city.clone(),
                v.venue.address.clone(),
                v.venue.capacity.to_string(),
                v.event_count.to_string(),
            ]
        })
        .collect();
    table(&["ID", "Name", "City", "Address", "Capacity", "Events"], &rows)
}

pub fn events(events: &[EventWithDetails]) -> String {
    let rows: Vec<Vec<String>> = events
        .iter()
        .map(|e| {
            vec![
                e.event.id.to_string(),
                e.event.name.clone(),
                e.event.event_date.format("%Y-%m-%d %H:%M").to_string(),
                e.venue_name.clone(),
                e.event.status.to_string(),
                format!("{}/{}", e.total_bookings, e.venue_capacity),
                e.available_capacity.to_string(),
            ]
        })
        .collect();
    table(&["ID", "Name", "Date", "Venue", "Status", "Booked", "Available"], &rows)
}

pub fn ticket_types(ticket_types: &[TicketType], analysis: Option<&TicketTypeAnalysis>) -> String {
    let rows: Vec<Vec<String>> = ticket_types
        .iter()
        .map(|t| {
            vec![
                t.id.to_string(),
                t.name.to_string(),
                money(t.price),
                t.description.clone().unwrap_or_default(),
            ]
        })
        .collect();
    let mut out = table(&["ID", "Category", "Price", "Description"], &rows);

    if let Some(analysis) = analysis {
        out.push('\n');
        let shares: Vec<(String, f64)> = analysis
            .ticket_types
            .iter()
            .map(|t| (t.name.to_string(), t.revenue_share_percentage))
            .collect();
        out.push_str(&bar_chart("== Revenue share ==", &shares, |v| format!("{:.2}%", v)));
    }
    out
}

pub fn bookings(bookings: &[BookingWithDetails]) -> String {
    let rows: Vec<Vec<String>> = bookings
        .iter()
        .map(|b| {
            vec![
                b.booking.id.to_string(),
                b.booking.booking_code.clone(),
                b.booking.customer_name.clone(),
                b.event_name.clone(),
                b.ticket_type_name.to_string(),
                b.booking.quantity.to_string(),
                money(b.booking.total_price),
                b.booking.status.to_string(),
            ]
        })
        .collect();
    let mut out = table(
        &["ID", "Code", "Customer", "Event", "Type", "Qty", "Total", "Status"],
        &rows,
    );
    let _ = writeln!(out, "{} booking(s)", bookings.len());
    out
}

pub fn availability(tickets: &AvailableTickets, revenue: &EventRevenue) -> String {
    let mut out = format!("== {} ==\n", tickets.event_name);
    let _ = writeln!(
        out,
        "  Seats:      {} booked / {} capacity",
        tickets.total_booked, tickets.venue_capacity
    );
    let _ = writeln!(
        out,
        "  Available:  {}{}",
        tickets.available_capacity,
        if tickets.is_sold_out { " (SOLD OUT)" } else { "" }
    );
    let _ = writeln!(
        out,
        "  Occupancy:  {}",
        bar(tickets.total_booked as f64, tickets.venue_capacity as f64, BAR_WIDTH)
    );
    let _ = writeln!(out, "  Confirmed revenue:  {}", money(revenue.confirmed_revenue));
    let _ = writeln!(out, "  Pending revenue:    {}", money(revenue.pending_revenue));
    out
}

pub fn occupancy(occupancy: &VenueOccupancy) -> String {
    let mut out = format!("== {} ==\n", occupancy.venue_name);
    let _ = writeln!(out, "  Events:     {}", occupancy.event_count);
    let _ = writeln!(
        out,
        "  Seats:      {} booked / {} capacity ({} free)",
        occupancy.total_bookings, occupancy.capacity, occupancy.available_capacity
    );
    let _ = writeln!(
        out,
        "  Occupancy:  {} {:.2}%",
        bar(occupancy.occupancy_percentage, 100.0, BAR_WIDTH),
        occupancy.occupancy_percentage
    );
    out
}

pub fn ticket_type_stats(stats: &TicketTypeStats) -> String {
    let mut out = format!("== {} at {} ==\n", stats.ticket_type_name, money(stats.price));
    let _ = writeln!(out, "  Bookings:      {}", stats.total_bookings);
    let _ = writeln!(out, "  Tickets sold:  {}", stats.total_tickets_sold);
    let _ = writeln!(out, "  Revenue:       {}", money(stats.total_revenue));

    let rows: Vec<Vec<String>> = stats
        .status_breakdown
        .iter()
        .map(|(status, summary)| {
            vec![
                status.to_string(),
                summary.booking_count.to_string(),
                summary.tickets_sold.to_string(),
                money(summary.revenue),
            ]
        })
        .collect();
    if !rows.is_empty() {
        out.push('\n');
        out.push_str(&table(&["Status", "Bookings", "Tickets", "Revenue"], &rows));
    }
    out
}

pub fn booking(booking: &Booking) -> String {
    let mut out = format!("Booking {} ({})\n", booking.booking_code, booking.status);
    let _ = writeln!(out, "  Customer:  {} <{}>", booking.customer_name, booking.customer_email);
    let _ = writeln!(out, "  Quantity:  {}", booking.quantity);
    let _ = writeln!(out, "  Total:     {}", money(booking.total_price));
    if booking.status == BookingStatus::Pending {
        out.push_str("  Awaiting confirmation.\n");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn bars_scale_to_the_largest_value() {
        assert_eq!(bar(50.0, 100.0, 10), "█████");
        assert_eq!(bar(100.0, 100.0, 10).chars().count(), 10);
        assert_eq!(bar(0.1, 100.0, 10), "█");
        assert_eq!(bar(0.0, 100.0, 10), "");
        assert_eq!(bar(5.0, 0.0, 10), "");
    }

    #[test]
    fn table_columns_are_aligned() {
        let rows = vec![
            vec!["1".to_string(), "Arena".to_string()],
            vec!["22".to_string(), "Hall".to_string()],
        ];
        let text = table(&["ID", "Name"], &rows);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "ID  Name");
        assert_eq!(lines[1], "--  -----");
        assert_eq!(lines[2], "1   Arena");
        assert_eq!(lines[3], "22  Hall");
    }

    #[test]
    fn empty_chart_says_so() {
        let text = bar_chart("== Revenue by month ==", &[], money);
        assert!(text.contains("(no data)"));
    }

    #[test]
    fn sold_out_events_are_flagged() {
        let tickets = AvailableTickets {
            event_id: 1,
            event_name: "Finals".into(),
            venue_capacity: 10,
            total_booked: 10,
            available_capacity: 0,
            is_sold_out: true,
        };
        let revenue = EventRevenue {
            event_id: 1,
            event_name: "Finals".into(),
            total_revenue: 500.0,
            pending_revenue: 0.0,
            confirmed_revenue: 500.0,
            status_breakdown: Default::default(),
        };
        let text = availability(&tickets, &revenue);

        assert!(text.contains("(SOLD OUT)"));
        assert!(text.contains("$500.00"));
    }

    #[test]
    fn pending_booking_is_marked() {
        let b = Booking {
            id: 1,
            booking_code: "BK-20260101-ABC123".into(),
            customer_name: "Ada".into(),
            customer_email: "ada@example.com".into(),
            event_id: 1,
            ticket_type_id: 1,
            quantity: 3,
            total_price: 150.0,
            status: BookingStatus::Pending,
            created_at: Utc::now(),
        };
        let text = booking(&b);
        assert!(text.starts_with("Booking BK-20260101-ABC123 (pending)"));
        assert!(text.contains("$150.00"));
        assert!(text.contains("Awaiting confirmation"));
    }

    #[test]
    fn occupancy_shows_free_seats_and_rate() {
        let text = occupancy(&VenueOccupancy {
            venue_id: 3,
            venue_name: "Riverside Hall".into(),
            capacity: 200,
            total_bookings: 50,
            available_capacity: 150,
            occupancy_percentage: 25.0,
            event_count: 2,
        });

        assert!(text.starts_with("== Riverside Hall =="));
        assert!(text.contains("50 booked / 200 capacity (150 free)"));
        assert!(text.contains("25.00%"));
    }

    #[test]
    fn ticket_type_stats_list_each_status() {
        let mut status_breakdown = std::collections::BTreeMap::new();
        status_breakdown.insert(
            BookingStatus::Confirmed,
            crate::models::StatusSummary { booking_count: 2, tickets_sold: 5, revenue: 500.0 },
        );
        status_breakdown.insert(
            BookingStatus::Cancelled,
            crate::models::StatusSummary { booking_count: 1, tickets_sold: 1, revenue: 100.0 },
        );
        let text = ticket_type_stats(&TicketTypeStats {
            ticket_type_id: 1,
            ticket_type_name: crate::models::TicketCategory::Vip,
            price: 100.0,
            total_bookings: 2,
            total_tickets_sold: 5,
            total_revenue: 500.0,
            status_breakdown,
        });

        assert!(text.starts_with("== VIP at $100.00 =="));
        assert!(text.contains("Tickets sold:  5"));
        assert!(text.lines().any(|l| l.starts_with("confirmed") && l.ends_with("$500.00")));
        assert!(text.lines().any(|l| l.starts_with("cancelled")));
    }
}
